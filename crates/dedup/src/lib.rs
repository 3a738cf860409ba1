//! `faed-dedup` — duplicate signalisation resolution engine.
//!
//! Pure engine crate: receives validated rows, returns the partition into
//! conserved, to-delete and excluded records. No filesystem access.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod grouping;
pub mod loader;
pub mod model;
pub mod record;
pub mod resolver;

pub use config::DedupConfig;
pub use engine::{run, run_records};
pub use error::DedupError;
pub use model::{
    Decision, DedupResult, DedupStats, RawRow, ResolutionOutcome, Rule, SignalisationId,
    SignalisationRecord, Verdict,
};
