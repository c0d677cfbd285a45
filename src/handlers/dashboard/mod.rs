// handlers/dashboard/mod.rs - session-guarded pages
//
// Every route in this module is mounted behind `middleware::require_session`,
// so handlers can rely on a `Session` in request extensions.
pub mod adoptions;
pub mod animals;
pub mod donations;
pub mod expenses;
pub mod sponsorships;
pub mod summary;

pub use adoptions::*;
pub use animals::*;
pub use donations::*;
pub use expenses::*;
pub use sponsorships::*;
pub use summary::*;
