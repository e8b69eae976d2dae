use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use saude_core::{DomainError, DomainResult, Entity, PersonId};

/// Comorbidity recorded when none is informed.
pub const NO_COMORBIDITY: &str = "Nenhuma";

const CPF_DIGITS: usize = 11;
const CNS_DIGITS: usize = 15;

/// Editable person attributes, as received on register/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDetails {
    pub nome_completo: String,
    pub cpf: String,
    pub sexo: String,
    #[serde(with = "crate::date")]
    pub data_nascimento: NaiveDate,
    #[serde(default)]
    pub comorbidade: Option<String>,
    pub etnia: String,
    pub cns: String,
    pub comunidade: String,
}

/// Entity: Person (patient).
///
/// People are never hard-deleted; deactivation hides them from the default
/// listing while keeping their vaccination history resolvable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    id: PersonId,
    full_name: String,
    cpf: String,
    sex: String,
    birth_date: NaiveDate,
    comorbidity: String,
    ethnicity: String,
    cns: String,
    community: String,
    active: bool,
    created_at: DateTime<Utc>,
}

impl Person {
    /// Validate `details` and build a new, active person.
    ///
    /// `today` bounds the birth date; pass it explicitly so tests stay deterministic.
    pub fn register(
        id: PersonId,
        details: PersonDetails,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let details = normalize(details, today)?;
        Ok(Self {
            id,
            full_name: details.nome_completo,
            cpf: details.cpf,
            sex: details.sexo,
            birth_date: details.data_nascimento,
            comorbidity: details.comorbidade.unwrap_or_else(|| NO_COMORBIDITY.to_string()),
            ethnicity: details.etnia,
            cns: details.cns,
            community: details.comunidade,
            active: true,
            created_at: now,
        })
    }

    /// Replace all editable attributes.
    ///
    /// Updating an inactive person reactivates it.
    pub fn update(&mut self, details: PersonDetails, today: NaiveDate) -> DomainResult<()> {
        let details = normalize(details, today)?;
        self.full_name = details.nome_completo;
        self.cpf = details.cpf;
        self.sex = details.sexo;
        self.birth_date = details.data_nascimento;
        self.comorbidity = details.comorbidade.unwrap_or_else(|| NO_COMORBIDITY.to_string());
        self.ethnicity = details.etnia;
        self.cns = details.cns;
        self.community = details.comunidade;
        self.active = true;
        Ok(())
    }

    /// Soft delete.
    pub fn deactivate(&mut self) -> DomainResult<()> {
        if !self.active {
            return Err(DomainError::conflict("person is already inactive"));
        }
        self.active = false;
        Ok(())
    }

    pub fn uuid(&self) -> PersonId {
        self.id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn cpf(&self) -> &str {
        &self.cpf
    }

    pub fn sex(&self) -> &str {
        &self.sex
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    pub fn comorbidity(&self) -> &str {
        &self.comorbidity
    }

    pub fn ethnicity(&self) -> &str {
        &self.ethnicity
    }

    pub fn cns(&self) -> &str {
        &self.cns
    }

    pub fn community(&self) -> &str {
        &self.community
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Person {
    type Id = PersonId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn normalize(mut d: PersonDetails, today: NaiveDate) -> DomainResult<PersonDetails> {
    d.nome_completo = required("nomeCompleto", &d.nome_completo)?;
    d.sexo = required("sexo", &d.sexo)?;
    d.etnia = required("etnia", &d.etnia)?;
    d.comunidade = required("comunidade", &d.comunidade)?;
    d.cpf = digits("cpf", &d.cpf, CPF_DIGITS)?;
    d.cns = digits("cns", &d.cns, CNS_DIGITS)?;
    d.comorbidade = d
        .comorbidade
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    if d.data_nascimento > today {
        return Err(DomainError::validation("dataNascimento cannot be in the future"));
    }
    Ok(d)
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Accepts formatted input ("123.456.789-01") and keeps only the digits.
fn digits(field: &str, value: &str, len: usize) -> DomainResult<String> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(*c, '.' | '-' | ' ' | '/'))
        .collect();
    if cleaned.len() != len || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::validation(format!("{field} must have {len} digits")));
    }
    Ok(cleaned)
}

/// Response shape for a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonResponse {
    pub uuid: PersonId,
    pub nome_completo: String,
    pub cpf: String,
    pub sexo: String,
    #[serde(with = "crate::date")]
    pub data_nascimento: NaiveDate,
    pub comorbidade: String,
    pub etnia: String,
    pub cns: String,
    pub comunidade: String,
    pub ativo: bool,
}

impl From<&Person> for PersonResponse {
    fn from(p: &Person) -> Self {
        Self {
            uuid: p.id,
            nome_completo: p.full_name.clone(),
            cpf: p.cpf.clone(),
            sexo: p.sex.clone(),
            data_nascimento: p.birth_date,
            comorbidade: p.comorbidity.clone(),
            etnia: p.ethnicity.clone(),
            cns: p.cns.clone(),
            comunidade: p.community.clone(),
            ativo: p.active,
        }
    }
}
