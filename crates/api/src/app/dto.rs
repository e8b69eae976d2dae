use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use saude_core::{PersonId, VaccineId};

use crate::app::services::VaccinationInput;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /vacinacoes` and `PUT /vacinacoes/:uuid`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationRequest {
    pub pessoa_uuid: PersonId,
    pub vacina_uuid: VaccineId,
    #[serde(with = "saude_records::date")]
    pub data_aplicacao: NaiveDate,
    #[serde(with = "saude_records::date::option", default)]
    pub data_proxima_dose: Option<NaiveDate>,
}

impl From<VaccinationRequest> for VaccinationInput {
    fn from(r: VaccinationRequest) -> Self {
        Self {
            person_id: r.pessoa_uuid,
            vaccine_id: r.vacina_uuid,
            applied_on: r.data_aplicacao,
            next_dose_on: r.data_proxima_dose,
        }
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// `?page=&size=` query parameters (page is zero-based).
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub size: Option<usize>,
}

impl PageParams {
    /// Resolved `(page, size)`; size is clamped to `1..=max_size`.
    pub fn resolve(&self, max_size: usize) -> (usize, usize) {
        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, max_size.max(1));
        (self.page.unwrap_or(0), size)
    }
}

// -------------------------
// Response envelopes
// -------------------------

/// Single-record envelope: `{"mensagem": ..., "dados": {...}}`.
#[derive(Debug, Serialize)]
pub struct ItemEnvelope<T> {
    pub mensagem: String,
    pub dados: T,
}

/// List envelope with pagination metadata.
#[derive(Debug, Serialize)]
pub struct PageEnvelope<T> {
    pub mensagem: String,
    pub dados: Vec<T>,
    pub pagina: usize,
    pub tamanho: usize,
    pub total: usize,
}

pub fn item<T: Serialize>(mensagem: impl Into<String>, dados: T) -> ItemEnvelope<T> {
    ItemEnvelope {
        mensagem: mensagem.into(),
        dados,
    }
}

/// Slice `items` (already in display order) into the requested page.
pub fn page<T: Serialize>(
    mensagem: impl Into<String>,
    items: Vec<T>,
    params: &PageParams,
    max_size: usize,
) -> PageEnvelope<T> {
    let (pagina, tamanho) = params.resolve(max_size);
    let total = items.len();
    let dados = items
        .into_iter()
        .skip(pagina.saturating_mul(tamanho))
        .take(tamanho)
        .collect();
    PageEnvelope {
        mensagem: mensagem.into(),
        dados,
        pagina,
        tamanho,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_defaults_and_is_capped() {
        assert_eq!(PageParams::default().resolve(1000), (0, DEFAULT_PAGE_SIZE));
        let p = PageParams { page: Some(2), size: Some(5000) };
        assert_eq!(p.resolve(1000), (2, 1000));
        let p = PageParams { page: None, size: Some(0) };
        assert_eq!(p.resolve(1000), (0, 1));
    }

    #[test]
    fn page_slices_and_reports_total() {
        let params = PageParams { page: Some(1), size: Some(2) };
        let env = page("ok", vec![1, 2, 3, 4, 5], &params, 100);
        assert_eq!(env.dados, vec![3, 4]);
        assert_eq!(env.total, 5);
        assert_eq!((env.pagina, env.tamanho), (1, 2));
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let params = PageParams { page: Some(usize::MAX), size: Some(10) };
        let env = page("ok", vec![1, 2, 3], &params, 100);
        assert!(env.dados.is_empty());
        assert_eq!(env.total, 3);
    }

    #[test]
    fn vaccination_request_reads_wire_names() {
        let p = PersonId::new();
        let v = VaccineId::new();
        let body = serde_json::json!({
            "pessoaUuid": p.to_string(),
            "vacinaUuid": v.to_string(),
            "dataAplicacao": "10/01/2024",
            "dataProximaDose": null,
        });
        let req: VaccinationRequest = serde_json::from_value(body).unwrap();
        let input = VaccinationInput::from(req);
        assert_eq!(input.person_id, p);
        assert_eq!(input.vaccine_id, v);
        assert_eq!(input.applied_on, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(input.next_dose_on, None);
    }
}
