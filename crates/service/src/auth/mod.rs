//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and the session token that carries the caller's
//! username to the ledger.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;
pub mod token;

pub use service::AuthService;
pub use token::TokenIssuer;
