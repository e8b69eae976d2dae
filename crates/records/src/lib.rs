//! `saude-records`: people, vaccines and vaccination events, plus the
//! projections that turn them into API response shapes.

pub mod date;
pub mod person;
pub mod projection;
pub mod vaccination;
pub mod vaccine;

pub use person::{Person, PersonDetails, PersonResponse};
pub use projection::{project, ProjectionError, ProjectionResult, Relation, VaccinationResponse};
pub use vaccination::Vaccination;
pub use vaccine::{Manufacturer, Vaccine, VaccineDetails, VaccineResponse};
