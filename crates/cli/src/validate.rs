//! `faed validate`: check an input table without resolving.

use std::collections::BTreeMap;
use std::path::PathBuf;

use faed_dedup::aggregate::count_anomalies;
use faed_dedup::model::{AnomalyCounts, FieldAnomaly};
use faed_dedup::SignalisationRecord;
use faed_io::read_table;
use serde::Serialize;

use crate::{delimiter_byte, load_config, CliError};

#[derive(Serialize)]
struct ValidationReport {
    path: PathBuf,
    fingerprint: String,
    encoding: &'static str,
    delimiter: String,
    rows: usize,
    excluded: usize,
    class_counts: BTreeMap<String, usize>,
    anomalies: AnomalyCounts,
}

pub fn cmd_validate(
    input: PathBuf,
    config: Option<PathBuf>,
    delimiter: Option<char>,
    json: bool,
) -> Result<(), CliError> {
    let config = load_config(config.as_ref())?;
    let table = read_table(&input, delimiter_byte(delimiter)?)?;

    let records: Vec<SignalisationRecord> = table
        .rows
        .into_iter()
        .map(|raw| SignalisationRecord::from_raw(raw, &config))
        .collect();

    let mut class_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut anomalies: Vec<FieldAnomaly> = Vec::new();
    let mut excluded = 0;
    for record in &records {
        *class_counts.entry(record.class_prefix().to_string()).or_insert(0) += 1;
        if faed_dedup::exclusion::is_excluded(&record.idpp, &config.excluded_prefix) {
            excluded += 1;
        } else {
            anomalies.extend(record.anomalies());
        }
    }

    let report = ValidationReport {
        path: input,
        fingerprint: table.fingerprint,
        encoding: table.encoding,
        delimiter: (table.delimiter as char).to_string(),
        rows: records.len(),
        excluded,
        class_counts,
        anomalies: count_anomalies(&anomalies),
    };

    if json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    eprintln!(
        "valid: {} signalisations in {} ({}, delimiter {:?})",
        report.rows,
        report.path.display(),
        report.encoding,
        report.delimiter
    );
    let classes: Vec<String> = report
        .class_counts
        .iter()
        .map(|(prefix, n)| format!("{prefix} {n}"))
        .collect();
    eprintln!("  classes: {}", classes.join(", "));
    eprintln!("  excluded ('{}' prefix): {}", config.excluded_prefix, report.excluded);
    eprintln!("  field anomalies: {}", report.anomalies.total());
    eprintln!("  input: {}", report.fingerprint);

    Ok(())
}
