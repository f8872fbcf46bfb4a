//! HTTP gateway for the netting engine
//!
//! Thin axum surface over [`netting_core::NettingService`]: typed DTOs
//! at the boundary, domain errors mapped to machine-readable HTTP
//! responses in [`error`].

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod extract;
pub mod routes;

pub use error::ApiError;
pub use extract::ValidatedJson;
pub use routes::{router, AppState};
