// CSV reports with a `#` comment header

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use faed_dedup::loader::{
    DATE_CREATION_FAED, DATE_NAISSANCE_MIN, IDENTIFIANT_GASPARD, NOM, NUMERO_CLICHE,
    NUMERO_PERSONNE, NUMERO_SIGNALISATION, NUM_PROCEDURE, PRENOM,
};
use faed_dedup::model::Decision;

use crate::error::IoError;
use crate::labels::{group_label, rule_detail, rule_label};

pub const ID_GROUPE: &str = "ID_GROUPE";
pub const REGLE_APPLIQUEE: &str = "REGLE_APPLIQUEE";
pub const DETAIL_REGLE: &str = "DETAIL_REGLE";

pub const DETAIL_COLUMNS: [&str; 12] = [
    NUMERO_SIGNALISATION,
    NUMERO_PERSONNE,
    IDENTIFIANT_GASPARD,
    NOM,
    PRENOM,
    DATE_NAISSANCE_MIN,
    DATE_CREATION_FAED,
    NUM_PROCEDURE,
    NUMERO_CLICHE,
    ID_GROUPE,
    REGLE_APPLIQUEE,
    DETAIL_REGLE,
];

pub const LIST_COLUMNS: [&str; 5] =
    [NUMERO_SIGNALISATION, IDENTIFIANT_GASPARD, NOM, PRENOM, REGLE_APPLIQUEE];

/// Comment block written above the CSV header row.
#[derive(Debug, Clone)]
pub struct ReportHeader<'a> {
    pub title: &'a str,
    pub run_at: NaiveDateTime,
    pub description: &'a [&'a str],
}

impl ReportHeader<'_> {
    fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "# {}", self.title)?;
        writeln!(out, "# Traitement effectué le {}", self.run_at.format("%d/%m/%Y à %H:%M"))?;
        for line in self.description {
            writeln!(out, "# {line}")?;
        }
        writeln!(out, "#")
    }
}

/// Singletons (`Aucun`) first, then groups by number, then signalisation number.
pub fn sorted(decisions: &[Decision]) -> Vec<&Decision> {
    let mut out: Vec<&Decision> = decisions.iter().collect();
    out.sort_by(|a, b| {
        a.group
            .cmp(&b.group)
            .then_with(|| a.record.signalisation_id.cmp(&b.record.signalisation_id))
    });
    out
}

/// Full report: the register columns plus group, rule and rule detail.
pub fn write_detail_report(
    path: &Path,
    header: &ReportHeader<'_>,
    decisions: &[Decision],
) -> Result<usize, IoError> {
    let mut wtr = open(path, header)?;
    wtr.write_record(DETAIL_COLUMNS)
        .map_err(|e| IoError::csv_write(path, e))?;

    let rows = sorted(decisions);
    for d in &rows {
        let r = &d.record;
        let group = group_label(d.group);
        let detail = rule_detail(d);
        wtr.write_record([
            r.signalisation_id.as_str(),
            r.person_id.as_str(),
            r.idpp.as_str(),
            r.last_name.as_str(),
            r.first_name.as_str(),
            r.birth_date_min.as_str(),
            r.creation_date.as_str(),
            r.procedure_ref.as_str(),
            r.photo_ref.as_deref().unwrap_or(""),
            group.as_str(),
            rule_label(d.rule),
            detail.as_str(),
        ])
        .map_err(|e| IoError::csv_write(path, e))?;
    }

    wtr.flush().map_err(|e| IoError::write(path, e))?;
    Ok(rows.len())
}

/// Short list of numbers to delete, for import into the register.
pub fn write_deletion_list(
    path: &Path,
    header: &ReportHeader<'_>,
    decisions: &[Decision],
) -> Result<usize, IoError> {
    let mut wtr = open(path, header)?;
    wtr.write_record(LIST_COLUMNS)
        .map_err(|e| IoError::csv_write(path, e))?;

    let rows = sorted(decisions);
    for d in &rows {
        let r = &d.record;
        wtr.write_record([
            r.signalisation_id.as_str(),
            r.idpp.as_str(),
            r.last_name.as_str(),
            r.first_name.as_str(),
            rule_label(d.rule),
        ])
        .map_err(|e| IoError::csv_write(path, e))?;
    }

    wtr.flush().map_err(|e| IoError::write(path, e))?;
    Ok(rows.len())
}

fn open(path: &Path, header: &ReportHeader<'_>) -> Result<csv::Writer<BufWriter<File>>, IoError> {
    let file = File::create(path).map_err(|e| IoError::write(path, e))?;
    let mut out = BufWriter::new(file);
    header.write_to(&mut out).map_err(|e| IoError::write(path, e))?;
    Ok(csv::Writer::from_writer(out))
}
