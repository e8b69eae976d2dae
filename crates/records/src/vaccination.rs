use chrono::{DateTime, NaiveDate, Utc};

use saude_core::{DomainError, DomainResult, Entity, PersonId, VaccinationId, VaccineId};

use crate::person::Person;
use crate::vaccine::Vaccine;

/// Entity: a vaccine dose administered to a person.
///
/// `person` and `vaccine` are many-to-one relations resolved by whoever loads
/// the record. They are optional because a stored row can outlive (or fail to
/// resolve) its related records; projection decides what to do about that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vaccination {
    id: VaccinationId,
    person: Option<Person>,
    vaccine: Option<Vaccine>,
    applied_on: NaiveDate,
    next_dose_on: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl Vaccination {
    /// Record a new vaccination, enforcing the registration rules.
    pub fn record(
        id: VaccinationId,
        person: Person,
        vaccine: Vaccine,
        applied_on: NaiveDate,
        next_dose_on: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        check_rules(&person, &vaccine, applied_on, next_dose_on)?;
        Ok(Self {
            id,
            person: Some(person),
            vaccine: Some(vaccine),
            applied_on,
            next_dose_on,
            created_at: now,
        })
    }

    /// Rebuild a vaccination from storage. No rules are checked.
    pub fn hydrate(
        id: VaccinationId,
        person: Option<Person>,
        vaccine: Option<Vaccine>,
        applied_on: NaiveDate,
        next_dose_on: Option<NaiveDate>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            person,
            vaccine,
            applied_on,
            next_dose_on,
            created_at,
        }
    }

    /// Re-point the record and replace its dates; same rules as [`Vaccination::record`].
    pub fn amend(
        &mut self,
        person: Person,
        vaccine: Vaccine,
        applied_on: NaiveDate,
        next_dose_on: Option<NaiveDate>,
    ) -> DomainResult<()> {
        check_rules(&person, &vaccine, applied_on, next_dose_on)?;
        self.person = Some(person);
        self.vaccine = Some(vaccine);
        self.applied_on = applied_on;
        self.next_dose_on = next_dose_on;
        Ok(())
    }

    pub fn uuid(&self) -> VaccinationId {
        self.id
    }

    pub fn person(&self) -> Option<&Person> {
        self.person.as_ref()
    }

    pub fn vaccine(&self) -> Option<&Vaccine> {
        self.vaccine.as_ref()
    }

    /// Ids of the related records, when resolved.
    pub fn relation_ids(&self) -> (Option<PersonId>, Option<VaccineId>) {
        (
            self.person.as_ref().map(Person::uuid),
            self.vaccine.as_ref().map(Vaccine::uuid),
        )
    }

    pub fn applied_on(&self) -> NaiveDate {
        self.applied_on
    }

    pub fn next_dose_on(&self) -> Option<NaiveDate> {
        self.next_dose_on
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Vaccination {
    type Id = VaccinationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn check_rules(
    person: &Person,
    vaccine: &Vaccine,
    applied_on: NaiveDate,
    next_dose_on: Option<NaiveDate>,
) -> DomainResult<()> {
    if !person.is_active() {
        return Err(DomainError::rule("cannot vaccinate an inactive person"));
    }
    if applied_on < person.birth_date() {
        return Err(DomainError::validation(
            "dataAplicacao cannot be before the person's birth date",
        ));
    }
    if vaccine.is_expired_on(applied_on) {
        return Err(DomainError::rule(format!(
            "vaccine lot {} was expired on the application date",
            vaccine.lot_number()
        )));
    }
    if let Some(next) = next_dose_on {
        if next <= applied_on {
            return Err(DomainError::validation(
                "dataProximaDose must be after dataAplicacao",
            ));
        }
    }
    Ok(())
}
