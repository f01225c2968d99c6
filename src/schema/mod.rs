//! The fixed portfolio schema, expressed as data.
//!
//! Tables, policies and the seed row are plain values; [`SchemaBatch`] orders
//! them into typed [`Statement`]s and renders the SQL that strategies ship.
//! Every statement is individually idempotent, so a batch can be re-applied
//! after a partial failure.

mod batch;
mod policy;
mod tables;

pub use batch::{BatchSummary, SchemaBatch, Statement};
pub use policy::{Policy, PolicyCommand};
pub use tables::{Column, PORTFOLIO_TABLES, TableDef};

/// Quote a string as a SQL literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
