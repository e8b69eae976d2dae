use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use saude_core::{DomainError, DomainResult, Entity, VaccineId};

/// Vaccine manufacturers accepted by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Manufacturer {
    PfizerBiontech,
    AstrazenecaFiocruz,
    SinovacButantan,
    Janssen,
    Moderna,
    SerumInstitute,
    SanofiPasteur,
    Glaxosmithkline,
    MerckSharpDohme,
}

impl Manufacturer {
    /// Human-readable label.
    pub fn display_name(self) -> &'static str {
        match self {
            Manufacturer::PfizerBiontech => "Pfizer Biontech",
            Manufacturer::AstrazenecaFiocruz => "AstraZeneca Fiocruz",
            Manufacturer::SinovacButantan => "Sinovac Butantan",
            Manufacturer::Janssen => "Janssen",
            Manufacturer::Moderna => "Moderna",
            Manufacturer::SerumInstitute => "Serum Institute of India",
            Manufacturer::SanofiPasteur => "Sanofi Pasteur",
            Manufacturer::Glaxosmithkline => "GlaxoSmithKline",
            Manufacturer::MerckSharpDohme => "Merck Sharp & Dohme",
        }
    }
}

/// Editable vaccine attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccineDetails {
    pub nome: String,
    pub numero_lote: String,
    pub fabricante: Manufacturer,
    #[serde(with = "crate::date")]
    pub data_fabricacao: NaiveDate,
    #[serde(with = "crate::date")]
    pub data_validade: NaiveDate,
}

/// Entity: Vaccine (a product lot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vaccine {
    id: VaccineId,
    name: String,
    lot_number: String,
    manufacturer: Manufacturer,
    manufactured_on: NaiveDate,
    expires_on: NaiveDate,
    created_at: DateTime<Utc>,
}

impl Vaccine {
    pub fn register(id: VaccineId, details: VaccineDetails, now: DateTime<Utc>) -> DomainResult<Self> {
        let d = normalize(details)?;
        Ok(Self {
            id,
            name: d.nome,
            lot_number: d.numero_lote,
            manufacturer: d.fabricante,
            manufactured_on: d.data_fabricacao,
            expires_on: d.data_validade,
            created_at: now,
        })
    }

    pub fn update(&mut self, details: VaccineDetails) -> DomainResult<()> {
        let d = normalize(details)?;
        self.name = d.nome;
        self.lot_number = d.numero_lote;
        self.manufacturer = d.fabricante;
        self.manufactured_on = d.data_fabricacao;
        self.expires_on = d.data_validade;
        Ok(())
    }

    /// A lot is still usable on its expiry date.
    pub fn is_expired_on(&self, date: NaiveDate) -> bool {
        date > self.expires_on
    }

    pub fn uuid(&self) -> VaccineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lot_number(&self) -> &str {
        &self.lot_number
    }

    pub fn manufacturer(&self) -> Manufacturer {
        self.manufacturer
    }

    pub fn manufactured_on(&self) -> NaiveDate {
        self.manufactured_on
    }

    pub fn expires_on(&self) -> NaiveDate {
        self.expires_on
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Vaccine {
    type Id = VaccineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn normalize(mut d: VaccineDetails) -> DomainResult<VaccineDetails> {
    d.nome = d.nome.trim().to_string();
    d.numero_lote = d.numero_lote.trim().to_string();
    if d.nome.is_empty() {
        return Err(DomainError::validation("nome is required"));
    }
    if d.numero_lote.is_empty() {
        return Err(DomainError::validation("numeroLote is required"));
    }
    if d.data_validade < d.data_fabricacao {
        return Err(DomainError::validation(
            "dataValidade must not be before dataFabricacao",
        ));
    }
    Ok(d)
}

/// Response shape for a vaccine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccineResponse {
    pub uuid: VaccineId,
    pub nome: String,
    pub numero_lote: String,
    pub fabricante: Manufacturer,
    /// Human label for `fabricante`, as shown in listings.
    pub fabricante_nome: String,
    #[serde(with = "crate::date")]
    pub data_fabricacao: NaiveDate,
    #[serde(with = "crate::date")]
    pub data_validade: NaiveDate,
}

impl From<&Vaccine> for VaccineResponse {
    fn from(v: &Vaccine) -> Self {
        Self {
            uuid: v.id,
            nome: v.name.clone(),
            numero_lote: v.lot_number.clone(),
            fabricante: v.manufacturer,
            fabricante_nome: v.manufacturer.display_name().to_string(),
            data_fabricacao: v.manufactured_on,
            data_validade: v.expires_on,
        }
    }
}
