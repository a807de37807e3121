//! Shop ledger: domain views, repository abstraction, SQL implementation and
//! the service that materializes shops with their avatars.
//!
//! Ownership is enforced as a filter on each mutating statement and decided
//! by the affected-row count, never by a separate preceding read.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use domain::{PublicUser, ShopView};
pub use service::LedgerService;
