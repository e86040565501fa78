//! Guestlens - Batch analytics engine for smart-speaker guest conversation logs
//!
//! Guestlens turns exported hotel conversation CSVs into chart-ready aggregates
//! and plain-text stay-period reports through a deterministic pipeline:
//! CSV ingest → field mapping → filtering → risk classification → aggregation
//! → stay segmentation → report formatting.
//!
//! ## Modules
//!
//! - **Ingest & Mapping**: Parse uploads and flatten dotted source paths into
//!   the ten-field normalized schema
//! - **Analysis**: Filters, risk tiers, and the chart-ready aggregates
//! - **Export**: Stay-period segmentation and the text report

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod mapper;
pub mod pipeline;
pub mod report;
pub mod risk;
pub mod schema;
pub mod segment;
pub mod session;

pub use error::AnalysisError;
pub use filter::FilterSet;
pub use ingest::{load_table, read_csv, RawTable};
pub use pipeline::{compute_aggregates, export_report, Aggregates};
pub use report::{format_report, suggest_filename, ReportConfig};
pub use risk::RiskTier;
pub use schema::{NormalizedRecord, NormalizedTable, FIELDS, MAX_ROWS};
pub use segment::{segment, StayConfig, StayPeriod};
pub use session::AnalysisSession;

/// Guestlens version embedded in CLI output
pub const GUESTLENS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report and CLI provenance
pub const PRODUCER_NAME: &str = "guestlens";
