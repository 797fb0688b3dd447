//! `labelrecon`: reconciliation engine for crowdsourced classification records.
//!
//! Pure engine crate: receives an unreconciled table, returns one reconciled
//! row per subject plus per-field explanations and flags.
//! No CLI or file IO dependencies.

pub mod config;
pub mod error;
pub mod field;
pub mod flag;
pub mod fuzzy;
pub mod load;
mod note;
pub mod row;
pub mod spans;
pub mod summary;
pub mod table;

pub use config::ReconConfig;
pub use error::ReconError;
pub use field::{Field, FieldKind, FieldValue};
pub use flag::Flag;
pub use row::Row;
pub use summary::ReconSummary;
pub use table::{Column, Table, TableState};

/// Reconciled table and its statistics.
#[derive(Debug, Clone)]
pub struct ReconOutput {
    pub reconciled: Table,
    pub summary: ReconSummary,
}

/// Validate `config`, reconcile `input`, and summarize the result.
pub fn run(input: &Table, config: &ReconConfig) -> Result<ReconOutput, ReconError> {
    config.validate()?;
    let reconciled = input.reconcile(config)?;
    let summary = ReconSummary::build(input, &reconciled, config);
    Ok(ReconOutput { reconciled, summary })
}
