//! Domain layer for Structure Guardian
//!
//! Architecture: Domain Layer - Pure business logic with no infrastructure dependencies
//! - Violations and reports carry the outcome of a validation run
//! - Errors describe why a run could not start

pub mod violations;

pub use violations::*;
