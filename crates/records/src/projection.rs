//! Vaccination → response projection.
//!
//! Flattens the `person` and `vaccine` relations into `pessoaUuid` /
//! `vacinaUuid`; every other field is copied under the same name. Pure: no
//! I/O, no mutation of the input, safe to call from any number of threads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use saude_core::{PersonId, VaccinationId, VaccineId};

use crate::vaccination::Vaccination;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Relation of a vaccination that must be resolved before projecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Person,
    Vaccine,
}

impl core::fmt::Display for Relation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Relation::Person => f.write_str("person"),
            Relation::Vaccine => f.write_str("vaccine"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("no vaccination to project")]
    NullInput,

    /// The vaccination exists but one of its relations did not resolve.
    #[error("vaccination {vaccination} has no {relation}")]
    MissingRelation {
        vaccination: VaccinationId,
        relation: Relation,
    },
}

/// Response shape for a vaccination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationResponse {
    pub uuid: VaccinationId,
    #[serde(rename = "pessoaUuid")]
    pub person_uuid: PersonId,
    #[serde(rename = "vacinaUuid")]
    pub vaccine_uuid: VaccineId,
    #[serde(rename = "dataAplicacao", with = "crate::date")]
    pub applied_on: NaiveDate,
    #[serde(rename = "dataProximaDose", with = "crate::date::option", default)]
    pub next_dose_on: Option<NaiveDate>,
}

/// Project a vaccination into its response shape.
///
/// Fails with [`ProjectionError::NullInput`] when there is nothing to project
/// and with [`ProjectionError::MissingRelation`] when `person` or `vaccine` is
/// unresolved (`person` is reported first).
pub fn project(vaccination: Option<&Vaccination>) -> ProjectionResult<VaccinationResponse> {
    let v = vaccination.ok_or(ProjectionError::NullInput)?;
    let missing = |relation| ProjectionError::MissingRelation {
        vaccination: v.uuid(),
        relation,
    };

    let person = v.person().ok_or_else(|| missing(Relation::Person))?;
    let vaccine = v.vaccine().ok_or_else(|| missing(Relation::Vaccine))?;

    Ok(VaccinationResponse {
        uuid: v.uuid(),
        person_uuid: person.uuid(),
        vaccine_uuid: vaccine.uuid(),
        applied_on: v.applied_on(),
        next_dose_on: v.next_dose_on(),
    })
}

impl TryFrom<&Vaccination> for VaccinationResponse {
    type Error = ProjectionError;

    fn try_from(v: &Vaccination) -> Result<Self, Self::Error> {
        project(Some(v))
    }
}
