//! Application services: the operations behind the HTTP routes.
//!
//! Handlers stay thin; everything that touches the repository (uniqueness
//! checks, relation lookups, projection) lives here.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use saude_core::{DomainError, DomainResult, PersonId, VaccinationId, VaccineId};
use saude_infra::{RecordRepository, RepositoryError, StoreError};
use saude_records::{
    project, Person, PersonDetails, ProjectionError, Vaccination, VaccinationResponse, Vaccine,
    VaccineDetails,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Domain(e) => Self::Domain(e),
            RepositoryError::Store(e) => Self::Store(e),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Fields needed to record or amend a vaccination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaccinationInput {
    pub person_id: PersonId,
    pub vaccine_id: VaccineId,
    pub applied_on: NaiveDate,
    pub next_dose_on: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct AppServices {
    repo: RecordRepository,
    max_page_size: usize,
    /// Serializes check-then-write sequences (CPF uniqueness, vaccine usage)
    /// across the separate stores.
    writes: Arc<Mutex<()>>,
}

impl AppServices {
    pub fn new(repo: RecordRepository, max_page_size: usize) -> Self {
        Self {
            repo,
            max_page_size,
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn in_memory(max_page_size: usize) -> Self {
        Self::new(RecordRepository::in_memory(), max_page_size)
    }

    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    // The guard protects no data of its own, so a poisoned lock is still usable.
    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------
    // People
    // -------------------------

    pub fn register_person(&self, details: PersonDetails) -> ServiceResult<Person> {
        let now = Utc::now();
        let person = Person::register(PersonId::new(), details, now.date_naive(), now)?;

        let _writes = self.write_guard();
        self.ensure_cpf_free(person.cpf(), None)?;
        self.repo.save_person(person.clone())?;
        tracing::info!(person_id = %person.uuid(), "person registered");
        Ok(person)
    }

    pub fn update_person(&self, id: PersonId, details: PersonDetails) -> ServiceResult<Person> {
        let _writes = self.write_guard();
        let mut person = self.person(id)?;
        let was_active = person.is_active();
        person.update(details, Utc::now().date_naive())?;
        self.ensure_cpf_free(person.cpf(), Some(id))?;
        self.repo.save_person(person.clone())?;
        if was_active {
            tracing::info!(person_id = %id, "person updated");
        } else {
            tracing::info!(person_id = %id, "person reactivated");
        }
        Ok(person)
    }

    pub fn deactivate_person(&self, id: PersonId) -> ServiceResult<()> {
        let _writes = self.write_guard();
        let mut person = self.person(id)?;
        person.deactivate()?;
        self.repo.save_person(person)?;
        tracing::info!(person_id = %id, "person deactivated");
        Ok(())
    }

    pub fn person(&self, id: PersonId) -> DomainResult<Person> {
        self.repo
            .person(&id)
            .ok_or_else(|| DomainError::not_found("pessoa"))
    }

    pub fn person_by_cpf(&self, cpf: &str) -> DomainResult<Person> {
        let digits: String = cpf.chars().filter(char::is_ascii_digit).collect();
        self.repo
            .person_by_cpf(&digits)
            .ok_or_else(|| DomainError::not_found("pessoa"))
    }

    /// People ordered by name; inactive ones only when asked for.
    pub fn people(&self, include_inactive: bool) -> Vec<Person> {
        let mut people: Vec<Person> = self
            .repo
            .people()
            .into_iter()
            .filter(|p| include_inactive || p.is_active())
            .collect();
        people.sort_by(|a, b| {
            a.full_name()
                .to_lowercase()
                .cmp(&b.full_name().to_lowercase())
                .then_with(|| a.uuid().cmp(&b.uuid()))
        });
        people
    }

    /// Caller must hold the write guard.
    fn ensure_cpf_free(&self, cpf: &str, owner: Option<PersonId>) -> DomainResult<()> {
        match self.repo.person_by_cpf(cpf) {
            Some(existing) if Some(existing.uuid()) != owner => Err(DomainError::conflict(
                "a person with this cpf is already registered",
            )),
            _ => Ok(()),
        }
    }

    // -------------------------
    // Vaccines
    // -------------------------

    pub fn register_vaccine(&self, details: VaccineDetails) -> ServiceResult<Vaccine> {
        let vaccine = Vaccine::register(VaccineId::new(), details, Utc::now())?;
        self.repo.save_vaccine(vaccine.clone())?;
        tracing::info!(vaccine_id = %vaccine.uuid(), lot = vaccine.lot_number(), "vaccine registered");
        Ok(vaccine)
    }

    pub fn update_vaccine(&self, id: VaccineId, details: VaccineDetails) -> ServiceResult<Vaccine> {
        let _writes = self.write_guard();
        let mut vaccine = self.vaccine(id)?;
        vaccine.update(details)?;
        self.repo.save_vaccine(vaccine.clone())?;
        tracing::info!(vaccine_id = %id, "vaccine updated");
        Ok(vaccine)
    }

    /// Vaccines still referenced by a vaccination cannot be removed.
    pub fn delete_vaccine(&self, id: VaccineId) -> ServiceResult<()> {
        let _writes = self.write_guard();
        self.vaccine(id)?;
        let usages = self.repo.usages_of_vaccine(id);
        if usages > 0 {
            tracing::warn!(vaccine_id = %id, usages, "refusing to delete referenced vaccine");
            return Err(DomainError::conflict(format!(
                "vaccine is referenced by {usages} vaccination(s)"
            ))
            .into());
        }
        self.repo.remove_vaccine(&id)?;
        tracing::info!(vaccine_id = %id, "vaccine deleted");
        Ok(())
    }

    pub fn vaccine(&self, id: VaccineId) -> DomainResult<Vaccine> {
        self.repo
            .vaccine(&id)
            .ok_or_else(|| DomainError::not_found("vacina"))
    }

    pub fn vaccines(&self) -> Vec<Vaccine> {
        let mut vaccines = self.repo.vaccines();
        vaccines.sort_by(|a, b| {
            a.name()
                .to_lowercase()
                .cmp(&b.name().to_lowercase())
                .then_with(|| a.lot_number().cmp(b.lot_number()))
        });
        vaccines
    }

    // -------------------------
    // Vaccinations
    // -------------------------

    pub fn record_vaccination(&self, input: VaccinationInput) -> ServiceResult<VaccinationResponse> {
        let _writes = self.write_guard();
        let person = self.person(input.person_id)?;
        let vaccine = self.vaccine(input.vaccine_id)?;
        let vaccination = Vaccination::record(
            VaccinationId::new(),
            person,
            vaccine,
            input.applied_on,
            input.next_dose_on,
            Utc::now(),
        )?;
        self.repo.save_vaccination(&vaccination)?;
        tracing::info!(
            vaccination_id = %vaccination.uuid(),
            person_id = %input.person_id,
            vaccine_id = %input.vaccine_id,
            "vaccination recorded"
        );
        Ok(project(Some(&vaccination))?)
    }

    /// Unknown vaccinations are reported before the new person or vaccine is looked up.
    pub fn amend_vaccination(
        &self,
        id: VaccinationId,
        input: VaccinationInput,
    ) -> ServiceResult<VaccinationResponse> {
        let _writes = self.write_guard();
        let mut vaccination = self.load_vaccination(id)?;
        let person = self.person(input.person_id)?;
        let vaccine = self.vaccine(input.vaccine_id)?;
        vaccination.amend(person, vaccine, input.applied_on, input.next_dose_on)?;
        self.repo.save_vaccination(&vaccination)?;
        tracing::info!(vaccination_id = %id, "vaccination amended");
        Ok(project(Some(&vaccination))?)
    }

    pub fn delete_vaccination(&self, id: VaccinationId) -> ServiceResult<()> {
        let _writes = self.write_guard();
        if !self.repo.remove_vaccination(&id)? {
            return Err(DomainError::not_found("vacinação").into());
        }
        tracing::info!(vaccination_id = %id, "vaccination deleted");
        Ok(())
    }

    pub fn vaccination(&self, id: VaccinationId) -> ServiceResult<VaccinationResponse> {
        let vaccination = self.load_vaccination(id)?;
        Ok(project(Some(&vaccination))?)
    }

    /// All vaccinations, newest application first.
    pub fn vaccinations(&self) -> Vec<VaccinationResponse> {
        project_sorted(self.repo.vaccinations())
    }

    /// Vaccination history of one person, newest application first.
    pub fn history(&self, person_id: PersonId) -> DomainResult<Vec<VaccinationResponse>> {
        self.person(person_id)?;
        Ok(project_sorted(self.repo.vaccinations_of(person_id)))
    }

    fn load_vaccination(&self, id: VaccinationId) -> DomainResult<Vaccination> {
        self.repo
            .vaccination(&id)
            .ok_or_else(|| DomainError::not_found("vacinação"))
    }
}

/// Rows that fail to project are logged and left out, so one dangling row
/// does not take the whole listing down.
fn project_sorted(mut vaccinations: Vec<Vaccination>) -> Vec<VaccinationResponse> {
    vaccinations.sort_by(|a, b| {
        b.applied_on()
            .cmp(&a.applied_on())
            .then_with(|| b.created_at().cmp(&a.created_at()))
            .then_with(|| a.uuid().cmp(&b.uuid()))
    });
    vaccinations
        .iter()
        .filter_map(|v| match project(Some(v)) {
            Ok(out) => Some(out),
            Err(err) => {
                tracing::error!(error = %err, "vaccination left out of listing");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    use saude_records::Manufacturer;

    fn person_details(cpf: &str, name: &str) -> PersonDetails {
        PersonDetails {
            nome_completo: name.to_string(),
            cpf: cpf.to_string(),
            sexo: "FEMININO".to_string(),
            data_nascimento: NaiveDate::from_ymd_opt(1995, 8, 20).unwrap(),
            comorbidade: None,
            etnia: "Terena".to_string(),
            cns: "700000000000001".to_string(),
            comunidade: "Aldeia Bananal".to_string(),
        }
    }

    fn vaccine_details() -> VaccineDetails {
        let today = Utc::now().date_naive();
        VaccineDetails {
            nome: "Hepatite B".to_string(),
            numero_lote: "HB-01".to_string(),
            fabricante: Manufacturer::Glaxosmithkline,
            data_fabricacao: today - chrono::Duration::days(365),
            data_validade: today + chrono::Duration::days(365),
        }
    }

    fn input(p: &Person, v: &Vaccine, days_ago: i64) -> VaccinationInput {
        VaccinationInput {
            person_id: p.uuid(),
            vaccine_id: v.uuid(),
            applied_on: Utc::now().date_naive() - chrono::Duration::days(days_ago),
            next_dose_on: None,
        }
    }

    #[test]
    fn duplicate_cpf_is_a_conflict_but_self_update_is_not() {
        let svc = AppServices::in_memory(100);
        let p = svc.register_person(person_details("11111111111", "Ana")).unwrap();
        assert!(matches!(
            svc.register_person(person_details("111.111.111-11", "Bia")),
            Err(ServiceError::Domain(DomainError::Conflict(_)))
        ));
        assert!(svc.update_person(p.uuid(), person_details("11111111111", "Ana Maria")).is_ok());
    }

    #[test]
    fn people_listing_hides_inactive_unless_asked() {
        let svc = AppServices::in_memory(100);
        let a = svc.register_person(person_details("11111111111", "Zé")).unwrap();
        svc.register_person(person_details("22222222222", "Ana")).unwrap();
        svc.deactivate_person(a.uuid()).unwrap();

        let active: Vec<_> = svc.people(false).iter().map(|p| p.full_name().to_string()).collect();
        assert_eq!(active, vec!["Ana"]);
        assert_eq!(svc.people(true).len(), 2);
    }

    #[test]
    fn recorded_vaccination_is_projected_with_flat_ids() {
        let svc = AppServices::in_memory(100);
        let p = svc.register_person(person_details("11111111111", "Ana")).unwrap();
        let v = svc.register_vaccine(vaccine_details()).unwrap();

        let out = svc.record_vaccination(input(&p, &v, 3)).unwrap();
        assert_eq!(out.person_uuid, p.uuid());
        assert_eq!(out.vaccine_uuid, v.uuid());
        assert_eq!(svc.vaccination(out.uuid).unwrap(), out);
    }

    #[test]
    fn unknown_person_is_not_found() {
        let svc = AppServices::in_memory(100);
        let v = svc.register_vaccine(vaccine_details()).unwrap();
        let err = svc
            .record_vaccination(VaccinationInput {
                person_id: PersonId::new(),
                vaccine_id: v.uuid(),
                applied_on: Utc::now().date_naive(),
                next_dose_on: None,
            })
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::not_found("pessoa")));
    }

    #[test]
    fn referenced_vaccine_cannot_be_deleted() {
        let svc = AppServices::in_memory(100);
        let p = svc.register_person(person_details("11111111111", "Ana")).unwrap();
        let v = svc.register_vaccine(vaccine_details()).unwrap();
        let out = svc.record_vaccination(input(&p, &v, 1)).unwrap();

        assert!(matches!(
            svc.delete_vaccine(v.uuid()),
            Err(ServiceError::Domain(DomainError::Conflict(_)))
        ));

        svc.delete_vaccination(out.uuid).unwrap();
        svc.delete_vaccine(v.uuid()).unwrap();
        assert!(matches!(svc.vaccine(v.uuid()), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn history_is_newest_first() {
        let svc = AppServices::in_memory(100);
        let p = svc.register_person(person_details("11111111111", "Ana")).unwrap();
        let v = svc.register_vaccine(vaccine_details()).unwrap();
        let old = svc.record_vaccination(input(&p, &v, 30)).unwrap();
        let new = svc.record_vaccination(input(&p, &v, 2)).unwrap();

        let ids: Vec<_> = svc.history(p.uuid()).unwrap().iter().map(|r| r.uuid).collect();
        assert_eq!(ids, vec![new.uuid, old.uuid]);
    }

    #[test]
    fn unresolvable_relation_surfaces_as_projection_error() {
        let repo = RecordRepository::in_memory();
        let svc = AppServices::new(repo.clone(), 100);
        let p = svc.register_person(person_details("11111111111", "Ana")).unwrap();
        let v = svc.register_vaccine(vaccine_details()).unwrap();
        let out = svc.record_vaccination(input(&p, &v, 1)).unwrap();

        // Bypass the service guard to simulate a dangling row.
        repo.remove_vaccine(&v.uuid()).unwrap();

        assert!(matches!(
            svc.vaccination(out.uuid),
            Err(ServiceError::Projection(ProjectionError::MissingRelation { .. }))
        ));
    }

    #[test]
    fn dangling_row_is_left_out_of_listings() {
        let repo = RecordRepository::in_memory();
        let svc = AppServices::new(repo.clone(), 100);
        let p = svc.register_person(person_details("11111111111", "Ana")).unwrap();
        let kept = svc.register_vaccine(vaccine_details()).unwrap();
        let gone = svc.register_vaccine(vaccine_details()).unwrap();
        let ok = svc.record_vaccination(input(&p, &kept, 5)).unwrap();
        svc.record_vaccination(input(&p, &gone, 1)).unwrap();

        repo.remove_vaccine(&gone.uuid()).unwrap();

        let all: Vec<_> = svc.vaccinations().iter().map(|r| r.uuid).collect();
        assert_eq!(all, vec![ok.uuid]);
        let history: Vec<_> = svc.history(p.uuid()).unwrap().iter().map(|r| r.uuid).collect();
        assert_eq!(history, vec![ok.uuid]);
    }

    #[test]
    fn amend_repoints_person_and_vaccine() {
        let svc = AppServices::in_memory(100);
        let ana = svc.register_person(person_details("11111111111", "Ana")).unwrap();
        let bia = svc.register_person(person_details("22222222222", "Bia")).unwrap();
        let hep = svc.register_vaccine(vaccine_details()).unwrap();
        let other = svc.register_vaccine(vaccine_details()).unwrap();
        let original = svc.record_vaccination(input(&ana, &hep, 10)).unwrap();

        let mut change = input(&bia, &other, 4);
        change.next_dose_on = Some(Utc::now().date_naive() + chrono::Duration::days(60));
        let amended = svc.amend_vaccination(original.uuid, change.clone()).unwrap();

        assert_eq!(amended.uuid, original.uuid);
        assert_eq!(amended.person_uuid, bia.uuid());
        assert_eq!(amended.vaccine_uuid, other.uuid());
        assert_eq!(amended.applied_on, change.applied_on);
        assert_eq!(amended.next_dose_on, change.next_dose_on);
        assert_eq!(svc.vaccination(original.uuid).unwrap(), amended);
        assert!(svc.history(ana.uuid()).unwrap().is_empty());
        assert_eq!(svc.history(bia.uuid()).unwrap(), vec![amended]);
    }

    #[test]
    fn amend_of_unknown_vaccination_is_not_found_before_relations() {
        let svc = AppServices::in_memory(100);
        let err = svc
            .amend_vaccination(
                VaccinationId::new(),
                VaccinationInput {
                    person_id: PersonId::new(),
                    vaccine_id: VaccineId::new(),
                    applied_on: Utc::now().date_naive(),
                    next_dose_on: None,
                },
            )
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::not_found("vacinação")));
    }

    #[test]
    fn amend_keeps_the_inactive_person_rule() {
        let svc = AppServices::in_memory(100);
        let ana = svc.register_person(person_details("11111111111", "Ana")).unwrap();
        let bia = svc.register_person(person_details("22222222222", "Bia")).unwrap();
        let v = svc.register_vaccine(vaccine_details()).unwrap();
        let out = svc.record_vaccination(input(&ana, &v, 3)).unwrap();
        svc.deactivate_person(bia.uuid()).unwrap();

        assert!(matches!(
            svc.amend_vaccination(out.uuid, input(&bia, &v, 3)),
            Err(ServiceError::Domain(DomainError::RuleViolation(_)))
        ));
        assert_eq!(svc.vaccination(out.uuid).unwrap(), out);
    }

    #[test]
    fn concurrent_registrations_never_share_a_cpf() {
        const THREADS: usize = 8;
        for _ in 0..50 {
            let svc = AppServices::in_memory(100);
            let barrier = Arc::new(Barrier::new(THREADS));
            let handles: Vec<_> = (0..THREADS)
                .map(|i| {
                    let svc = svc.clone();
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        svc.register_person(person_details("99988877766", &format!("P{i}")))
                    })
                })
                .collect();

            let registered = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(Result::is_ok)
                .count();
            assert_eq!(registered, 1);
            assert_eq!(svc.people(true).len(), 1);
        }
    }

    #[test]
    fn vaccine_deletion_and_new_vaccination_do_not_both_win() {
        for _ in 0..50 {
            let svc = AppServices::in_memory(100);
            let p = svc.register_person(person_details("11111111111", "Ana")).unwrap();
            let v = svc.register_vaccine(vaccine_details()).unwrap();
            let barrier = Arc::new(Barrier::new(2));

            let recorder = {
                let (svc, barrier, input) = (svc.clone(), Arc::clone(&barrier), input(&p, &v, 1));
                thread::spawn(move || {
                    barrier.wait();
                    svc.record_vaccination(input)
                })
            };
            let deleter = {
                let (svc, barrier, id) = (svc.clone(), Arc::clone(&barrier), v.uuid());
                thread::spawn(move || {
                    barrier.wait();
                    svc.delete_vaccine(id)
                })
            };

            let recorded = recorder.join().unwrap();
            let deleted = deleter.join().unwrap();
            assert_ne!(recorded.is_ok(), deleted.is_ok());
            for row in svc.vaccinations() {
                assert!(svc.vaccine(row.vaccine_uuid).is_ok());
            }
        }
    }
}
