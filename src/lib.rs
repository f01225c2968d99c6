//! # portfolio-schema
//!
//! Provisions the portfolio tables (`profile`, `projects`, `experiences`,
//! `skill_categories`), their row-level security policies and one seed
//! profile on a hosted Postgres project. Safe to run any number of times.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use portfolio_schema::config::ProvisionConfig;
//! use portfolio_schema::provision::{ProvisionOptions, provision};
//! use portfolio_schema::schema::SchemaBatch;
//!
//! let config = ProvisionConfig::from_env()?;
//! let batch = SchemaBatch::portfolio();
//! let report = provision(&config, &batch, ProvisionOptions::default(), |_| {})?;
//! assert!(report.schema_applied());
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod provision;
pub mod rest;
pub mod schema;
pub mod strategy;
pub mod types;
