pub mod manager;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{connect_lazy, connect_options, DatabaseError};
pub use postgres::PgStore;
pub use store::{LookupStore, PatientStore, RegistryStore, UserStore};
