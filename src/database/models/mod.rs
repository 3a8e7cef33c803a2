pub mod lookup;
pub mod patient;
pub mod user;

pub use lookup::{LookupItem, LookupKind};
pub use patient::{Page, Patient, PatientInput, PatientQuery, PatientSummary, DEFAULT_ESTADO};
pub use user::{UserProfile, UserRecord};
