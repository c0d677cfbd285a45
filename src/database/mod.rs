pub mod handle;
pub mod models;
pub mod postgres;
pub mod store;

pub use handle::{DatabaseError, LazyDatabase, PgConnector, PoolConnector, PoolSettings};
pub use postgres::PgStore;
pub use store::{DashboardSummary, ShelterStore};
