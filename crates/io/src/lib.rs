// File I/O around the resolution engine

pub mod backup;
pub mod error;
pub mod export;
pub mod labels;
pub mod report_csv;
pub mod source;
pub mod summary;

pub use error::IoError;
pub use export::{export_reports, ExportSummary, ExportedFile, ReportContext, ReportKind};
pub use source::{read_table, InputTable};
