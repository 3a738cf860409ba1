// Report export into a timestamped directory

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use faed_dedup::DedupResult;
use serde::Serialize;

use crate::error::IoError;
use crate::report_csv::{write_deletion_list, write_detail_report, ReportHeader};
use crate::summary::{render_html, render_text, SummaryInput};

/// Where and when reports are written, and what they describe.
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Base directory; reports go into `<export_dir>/<YYYYMMDD_HHMM>/`.
    pub export_dir: PathBuf,
    pub run_at: NaiveDateTime,
    pub input_name: String,
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Conserved,
    ToDelete,
    DeletionList,
    SummaryHtml,
    SummaryText,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub kind: ReportKind,
    pub path: PathBuf,
    /// Records written, for CSV reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub directory: PathBuf,
    pub files: Vec<ExportedFile>,
}

const CONSERVED_DESCRIPTION: &[&str] = &[
    "Signalisations CONSERVÉES après analyse des doublons.",
    "REGLE_APPLIQUEE : règle qui a décidé de la conservation.",
    "DETAIL_REGLE : explication de la décision.",
    "ID_GROUPE : même valeur = même groupe de doublons, Aucun = signalisation sans doublon.",
];

const TO_DELETE_DESCRIPTION: &[&str] = &[
    "Signalisations marquées comme DOUBLONS, à SUPPRIMER.",
    "REGLE_APPLIQUEE : règle qui a désigné la signalisation conservée à leur place.",
    "DETAIL_REGLE : explication de la décision.",
    "ID_GROUPE : même valeur = même groupe de doublons.",
];

const LIST_DESCRIPTION: &[&str] = &[
    "Numéros de signalisation à supprimer, pour import dans le système de gestion.",
    "Le détail des décisions figure dans le rapport des signalisations à supprimer.",
];

/// Write the five report files. Excluded records appear in none of the CSV reports.
pub fn export_reports(result: &DedupResult, ctx: &ReportContext) -> Result<ExportSummary, IoError> {
    let stamp = ctx.run_at.format("%Y%m%d_%H%M").to_string();
    let directory = ctx.export_dir.join(&stamp);
    std::fs::create_dir_all(&directory).map_err(|source| IoError::CreateDir {
        path: directory.clone(),
        source,
    })?;

    let excluded_note = format!(
        "Les signalisations dont l'IDPP commence par '{}' ne figurent pas dans ce fichier.",
        result.meta.excluded_prefix
    );
    let with_note = |lines: &[&'static str]| -> Vec<String> {
        lines.iter().map(|l| l.to_string()).chain([excluded_note.clone()]).collect()
    };

    let mut files = Vec::new();

    let path = directory.join(format!("RAPPORT_Signalisations_Conservees_{stamp}.csv"));
    let header = ReportHeader {
        title: "SIGNALISATIONS CONSERVÉES",
        run_at: ctx.run_at,
        description: CONSERVED_DESCRIPTION,
    };
    let records = write_detail_report(&path, &header, &result.conserved)?;
    files.push(ExportedFile { kind: ReportKind::Conserved, path, records: Some(records) });

    let path = directory.join(format!("RAPPORT_Signalisations_A_Supprimer_{stamp}.csv"));
    let lines = with_note(TO_DELETE_DESCRIPTION);
    let description: Vec<&str> = lines.iter().map(String::as_str).collect();
    let header = ReportHeader {
        title: "SIGNALISATIONS À SUPPRIMER",
        run_at: ctx.run_at,
        description: &description,
    };
    let records = write_detail_report(&path, &header, &result.to_delete)?;
    files.push(ExportedFile { kind: ReportKind::ToDelete, path, records: Some(records) });

    let path = directory.join(format!("LISTE_Numeros_Signalisations_A_Supprimer_{stamp}.csv"));
    let lines = with_note(LIST_DESCRIPTION);
    let description: Vec<&str> = lines.iter().map(String::as_str).collect();
    let header = ReportHeader {
        title: "LISTE DES NUMÉROS DE SIGNALISATION À SUPPRIMER",
        run_at: ctx.run_at,
        description: &description,
    };
    let records = write_deletion_list(&path, &header, &result.to_delete)?;
    files.push(ExportedFile { kind: ReportKind::DeletionList, path, records: Some(records) });

    let html_path = directory.join(format!("RESUME_Traitement_Doublons_{stamp}.html"));
    let text_path = directory.join(format!("RESUME_Traitement_Doublons_{stamp}.txt"));
    files.push(ExportedFile {
        kind: ReportKind::SummaryHtml,
        path: html_path.clone(),
        records: None,
    });
    files.push(ExportedFile {
        kind: ReportKind::SummaryText,
        path: text_path.clone(),
        records: None,
    });

    let input = SummaryInput {
        stats: &result.stats,
        meta: &result.meta,
        run_at: ctx.run_at,
        input_name: &ctx.input_name,
        fingerprint: ctx.fingerprint.as_deref(),
        files: &files,
    };
    let html = render_html(&input);
    let text = render_text(&input);
    write_text(&html_path, &html)?;
    write_text(&text_path, &text)?;

    for file in &files {
        match file.records {
            Some(n) => log::info!("wrote {} ({n} records)", file.path.display()),
            None => log::info!("wrote {}", file.path.display()),
        }
    }

    Ok(ExportSummary { directory, files })
}

fn write_text(path: &Path, content: &str) -> Result<(), IoError> {
    std::fs::write(path, content).map_err(|e| IoError::write(path, e))
}
