//! Record repository: stores people, vaccines and vaccination rows, and
//! hydrates vaccination relations on read.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use saude_core::{DomainError, PersonId, VaccinationId, VaccineId};
use saude_records::{Person, Vaccination, Vaccine};

use crate::read_model::{InMemoryRecordStore, RecordStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The record cannot be persisted in its current shape.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Persisted form of a vaccination: relations are kept as ids only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVaccination {
    pub id: VaccinationId,
    pub person_id: PersonId,
    pub vaccine_id: VaccineId,
    pub applied_on: NaiveDate,
    pub next_dose_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Vaccination> for StoredVaccination {
    type Error = DomainError;

    fn try_from(v: &Vaccination) -> Result<Self, Self::Error> {
        match v.relation_ids() {
            (Some(person_id), Some(vaccine_id)) => Ok(Self {
                id: v.uuid(),
                person_id,
                vaccine_id,
                applied_on: v.applied_on(),
                next_dose_on: v.next_dose_on(),
                created_at: v.created_at(),
            }),
            _ => Err(DomainError::rule(
                "vaccination must reference a person and a vaccine",
            )),
        }
    }
}

pub type PersonStore = Arc<dyn RecordStore<PersonId, Person>>;
pub type VaccineStore = Arc<dyn RecordStore<VaccineId, Vaccine>>;
pub type VaccinationStore = Arc<dyn RecordStore<VaccinationId, StoredVaccination>>;

#[derive(Clone)]
pub struct RecordRepository {
    people: PersonStore,
    vaccines: VaccineStore,
    vaccinations: VaccinationStore,
}

impl RecordRepository {
    pub fn new(people: PersonStore, vaccines: VaccineStore, vaccinations: VaccinationStore) -> Self {
        Self {
            people,
            vaccines,
            vaccinations,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryRecordStore::<PersonId, Person>::new()),
            Arc::new(InMemoryRecordStore::<VaccineId, Vaccine>::new()),
            Arc::new(InMemoryRecordStore::<VaccinationId, StoredVaccination>::new()),
        )
    }

    // -------------------------
    // People
    // -------------------------

    pub fn person(&self, id: &PersonId) -> Option<Person> {
        self.people.get(id)
    }

    pub fn person_by_cpf(&self, cpf: &str) -> Option<Person> {
        self.people.find(&|p: &Person| p.cpf() == cpf).into_iter().next()
    }

    pub fn save_person(&self, person: Person) -> RepositoryResult<()> {
        Ok(self.people.upsert(person.uuid(), person)?)
    }

    pub fn people(&self) -> Vec<Person> {
        self.people.list()
    }

    // -------------------------
    // Vaccines
    // -------------------------

    pub fn vaccine(&self, id: &VaccineId) -> Option<Vaccine> {
        self.vaccines.get(id)
    }

    pub fn save_vaccine(&self, vaccine: Vaccine) -> RepositoryResult<()> {
        Ok(self.vaccines.upsert(vaccine.uuid(), vaccine)?)
    }

    pub fn remove_vaccine(&self, id: &VaccineId) -> RepositoryResult<Option<Vaccine>> {
        Ok(self.vaccines.remove(id)?)
    }

    pub fn vaccines(&self) -> Vec<Vaccine> {
        self.vaccines.list()
    }

    // -------------------------
    // Vaccinations
    // -------------------------

    pub fn vaccination(&self, id: &VaccinationId) -> Option<Vaccination> {
        self.vaccinations.get(id).map(|row| self.hydrate(row))
    }

    pub fn save_vaccination(&self, vaccination: &Vaccination) -> RepositoryResult<()> {
        let row = StoredVaccination::try_from(vaccination)?;
        Ok(self.vaccinations.upsert(row.id, row)?)
    }

    /// `Ok(false)` when no such vaccination was stored.
    pub fn remove_vaccination(&self, id: &VaccinationId) -> RepositoryResult<bool> {
        Ok(self.vaccinations.remove(id)?.is_some())
    }

    pub fn vaccinations(&self) -> Vec<Vaccination> {
        self.vaccinations
            .list()
            .into_iter()
            .map(|row| self.hydrate(row))
            .collect()
    }

    pub fn vaccinations_of(&self, person_id: PersonId) -> Vec<Vaccination> {
        self.vaccinations
            .find(&|row: &StoredVaccination| row.person_id == person_id)
            .into_iter()
            .map(|row| self.hydrate(row))
            .collect()
    }

    /// Number of vaccination rows pointing at `vaccine_id`.
    pub fn usages_of_vaccine(&self, vaccine_id: VaccineId) -> usize {
        self.vaccinations
            .find(&|row: &StoredVaccination| row.vaccine_id == vaccine_id)
            .len()
    }

    fn hydrate(&self, row: StoredVaccination) -> Vaccination {
        let person = self.people.get(&row.person_id);
        let vaccine = self.vaccines.get(&row.vaccine_id);
        if person.is_none() || vaccine.is_none() {
            tracing::warn!(
                vaccination_id = %row.id,
                person_id = %row.person_id,
                vaccine_id = %row.vaccine_id,
                person_resolved = person.is_some(),
                vaccine_resolved = vaccine.is_some(),
                "vaccination relation did not resolve"
            );
        }
        Vaccination::hydrate(
            row.id,
            person,
            vaccine,
            row.applied_on,
            row.next_dose_on,
            row.created_at,
        )
    }
}
