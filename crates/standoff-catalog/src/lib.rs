//! Server-operator configuration data: territories, cities, the hacking
//! network topology, and per-`HackType` progress curves.

pub mod catalog;
pub mod error;

pub use catalog::Catalog;
pub use error::CatalogError;
