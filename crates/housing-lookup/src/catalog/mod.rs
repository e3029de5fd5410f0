//! City and institution catalog: seed loading, accent-insensitive search, the HTTP endpoints
//! that expose it, and the HTTP client lookups use to reach it.

mod client;
pub mod domain;
mod normalizer;
pub mod router;
pub mod seed;
pub mod store;

pub use client::{HttpCatalogClient, HttpCatalogSource};
pub use domain::{City, Institution, InstitutionKind, InstitutionSeed};
pub use router::catalog_router;
pub use seed::CatalogSeed;
pub use store::{CatalogError, CatalogKind, CatalogSource, CatalogStore};
