//! `faed run`: load, back up, resolve, export.

use std::path::PathBuf;

use faed_config::Settings;
use faed_dedup::model::Rule;
use faed_dedup::DedupResult;
use faed_io::{export_reports, read_table, ExportSummary, ReportContext};
use serde::Serialize;

use crate::exit_codes::{EXIT_DUPLICATES_FOUND, EXIT_IO};
use crate::{delimiter_byte, load_config, CliError, RunArgs};

#[derive(Serialize)]
struct InputInfo {
    path: PathBuf,
    fingerprint: String,
    encoding: &'static str,
    delimiter: String,
}

/// `--json` / `--output` document.
#[derive(Serialize)]
struct RunOutput<'a> {
    input: InputInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<ExportSummary>,
    #[serde(flatten)]
    result: &'a DedupResult,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let settings = Settings::load();
    let config = load_config(args.config.as_ref())?;
    let delimiter = delimiter_byte(args.delimiter)?;
    let run_at = chrono::Local::now().naive_local();

    let table = read_table(&args.input, delimiter)?;
    let input = InputInfo {
        path: args.input.clone(),
        fingerprint: table.fingerprint.clone(),
        encoding: table.encoding,
        delimiter: (table.delimiter as char).to_string(),
    };

    let backup = if args.no_backup || !settings.backup {
        None
    } else {
        let dir = args.backup_dir.clone().unwrap_or_else(|| settings.effective_backup_dir());
        Some(faed_io::backup::backup_input(&args.input, &dir, run_at)?)
    };

    let result = faed_dedup::run(&config, table.rows)?;

    let export = if args.no_export {
        None
    } else {
        let ctx = ReportContext {
            export_dir: args.export_dir.clone().unwrap_or_else(|| settings.effective_export_dir()),
            run_at,
            input_name: args
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            fingerprint: Some(table.fingerprint.clone()),
        };
        Some(export_reports(&result, &ctx)?)
    };

    if args.json || args.output.is_some() {
        let doc = RunOutput {
            input,
            backup: backup.clone(),
            export: export.clone(),
            result: &result,
        };
        let json_str = serde_json::to_string_pretty(&doc)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = args.output {
            std::fs::write(path, &json_str).map_err(|e| {
                CliError::new(EXIT_IO, format!("cannot write output {}: {e}", path.display()))
            })?;
            eprintln!("wrote {}", path.display());
        }
        if args.json {
            println!("{json_str}");
        }
    }

    print_summary(&result, backup.as_ref(), export.as_ref(), &table.fingerprint);

    if args.strict_exit && result.stats.to_delete > 0 {
        return Err(CliError::new(
            EXIT_DUPLICATES_FOUND,
            format!("{} signalisations to delete", result.stats.to_delete),
        ));
    }

    Ok(())
}

/// Human summary to stderr.
fn print_summary(
    result: &DedupResult,
    backup: Option<&PathBuf>,
    export: Option<&ExportSummary>,
    fingerprint: &str,
) {
    let s = &result.stats;
    eprintln!(
        "{} signalisations: {} eligible, {} excluded ('{}' prefix)",
        s.total_input, s.eligible, s.excluded, result.meta.excluded_prefix
    );
    eprintln!(
        "  conserved: {} ({:.1}%), to delete: {} ({:.1}%), duplicate groups: {}",
        s.conserved, s.conserved_pct, s.to_delete, s.to_delete_pct, s.duplicate_groups
    );
    for rule in Rule::ALL.iter().filter(|r| **r != Rule::Unique) {
        let groups = s.groups_by_rule.get(rule).copied().unwrap_or(0);
        if groups > 0 {
            eprintln!("  {} ({rule}): {groups} groups", rule.tier());
        }
    }
    if s.anomalies.total() > 0 {
        eprintln!(
            "  anomalies: {} missing / {} unparsable creation dates, \
             {} missing / {} malformed procedure refs",
            s.anomalies.missing_creation_dates,
            s.anomalies.unparsable_creation_dates,
            s.anomalies.missing_procedure_refs,
            s.anomalies.malformed_procedure_refs
        );
    }
    eprintln!("  input: {fingerprint}");
    if let Some(path) = backup {
        eprintln!("  backup: {}", path.display());
    }
    if let Some(export) = export {
        eprintln!("  reports: {}", export.directory.display());
    }
}
