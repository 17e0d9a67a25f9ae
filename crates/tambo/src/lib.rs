//! Tambo survey - validation, section controllers and data interchange.
//!
//! The record store lives in `tambo_db`; this crate adds what sits between a
//! survey form and the store:
//!
//! - [`validate`]: field validators
//! - [`sections`]: one controller per survey section
//! - [`context`]: per-request session state
//! - [`import`] / [`export`]: section CSV files and JSON
//! - [`summary`]: computed farm and herd figures
//! - [`config`]: home directory and database path resolution

pub mod config;
pub mod context;
pub mod export;
pub mod import;
pub mod sections;
pub mod summary;
pub mod validate;

pub use context::SessionContext;
pub use sections::{submit, Section, SubmitError};
pub use validate::{Validation, ValidationErrors};
