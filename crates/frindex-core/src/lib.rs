//! frindex-core library.
//!
//! Builds the Federal Register agency-year index: entries are partitioned by
//! entry type, grouped by subject and document, and flagged when they need an
//! editor's attention.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums ([`error::IndexError`]) inside the
//!   pipeline, `anyhow::Result` at collaborator and I/O boundaries.
//! - **Logging**: `tracing` macros (`info!`, `debug!`).
//! - **Memoization**: per instance, via `std::cell::OnceCell`.

pub mod agency_year;
pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod grouping;
pub mod index;
pub mod memory;
pub mod model;
pub mod window;

#[cfg(test)]
mod fixtures;

pub use agency_year::{AgencyYear, AgencyYearOptions};
pub use backend::IndexBackend;
pub use error::{IndexError, Result};
pub use index::IndexBuilder;
