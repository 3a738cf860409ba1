//! Typed row loader. Validates the table shape before the engine sees it.

use std::collections::HashMap;

use crate::error::DedupError;
use crate::model::RawRow;

pub const NUMERO_SIGNALISATION: &str = "NUMERO_SIGNALISATION";
pub const NUMERO_PERSONNE: &str = "NUMERO_PERSONNE";
pub const IDENTIFIANT_GASPARD: &str = "IDENTIFIANT_GASPARD";
pub const NOM: &str = "NOM";
pub const PRENOM: &str = "PRENOM";
pub const DATE_NAISSANCE_MIN: &str = "DATE_NAISSANCE_MIN";
pub const DATE_CREATION_FAED: &str = "DATE_CREATION_FAED";
pub const NUM_PROCEDURE: &str = "NUM_PROCEDURE";
pub const NUMERO_CLICHE: &str = "NUMERO_CLICHE";

/// Mandatory columns, in the order of the register export.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    NUMERO_SIGNALISATION,
    NUMERO_PERSONNE,
    IDENTIFIANT_GASPARD,
    NOM,
    PRENOM,
    DATE_NAISSANCE_MIN,
    DATE_CREATION_FAED,
    NUM_PROCEDURE,
    NUMERO_CLICHE,
];

/// Parse CSV text (header row required) into validated rows.
///
/// Columns may appear in any order; extra columns are ignored. Lines
/// starting with `#` are comments, so exported reports can be read back.
pub fn parse_rows(csv_data: &str, delimiter: u8) -> Result<Vec<RawRow>, DedupError> {
    let csv_data = csv_data.strip_prefix('\u{feff}').unwrap_or(csv_data);
    if csv_data.trim().is_empty() {
        return Err(DedupError::EmptyInput);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DedupError::csv(&e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, DedupError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DedupError::MissingColumn { column: name.into() })
    };

    let mut cols = [0usize; 9];
    for (slot, name) in cols.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = idx(name)?;
    }
    let [sig, person, idpp, nom, prenom, birth, creation, procedure, cliche] = cols;

    let mut rows = Vec::new();
    let mut seen: HashMap<String, u64> = HashMap::new();

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DedupError::csv(&e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(row as u64 + 2);
        let field = |i: usize| record.get(i).unwrap_or("").to_string();

        let raw = RawRow {
            row,
            line,
            signalisation_id: field(sig),
            person_id: field(person),
            idpp: field(idpp),
            last_name: field(nom),
            first_name: field(prenom),
            birth_date_min: field(birth),
            creation_date: field(creation),
            procedure_ref: field(procedure),
            photo_ref: field(cliche),
        };

        let id = raw.signalisation_id.trim();
        if id.is_empty() {
            return Err(DedupError::EmptyField { line, column: NUMERO_SIGNALISATION });
        }
        if raw.idpp.trim().is_empty() {
            return Err(DedupError::EmptyField { line, column: IDENTIFIANT_GASPARD });
        }
        if let Some(&first_line) = seen.get(id) {
            return Err(DedupError::DuplicateSignalisationId {
                id: id.to_string(),
                first_line,
                line,
            });
        }
        seen.insert(id.to_string(), line);

        rows.push(raw);
    }

    if rows.is_empty() {
        return Err(DedupError::EmptyInput);
    }

    log::info!("{} signalisations loaded", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "NUMERO_SIGNALISATION,NUMERO_PERSONNE,IDENTIFIANT_GASPARD,NOM,PRENOM,DATE_NAISSANCE_MIN,DATE_CREATION_FAED,NUM_PROCEDURE,NUMERO_CLICHE";

    #[test]
    fn load_basic() {
        let csv = format!(
            "{HEADER}\n\
             12345,67890,GN123456789,DUPONT,Jean,01/01/1980,15/03/2024,00116/00149/2024,\n\
             67890,67890,GN123456789,DUPONT,Jean,01/01/1980,10/03/2024,00116/00150/2024,CL01\n"
        );
        let rows = parse_rows(&csv, b',').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].signalisation_id, "12345");
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].photo_ref, "");
        assert_eq!(rows[1].row, 1);
        assert_eq!(rows[1].photo_ref, "CL01");
    }

    #[test]
    fn columns_in_any_order_with_extras() {
        let csv = "\
EXTRA;NUMERO_CLICHE;NUM_PROCEDURE;DATE_CREATION_FAED;DATE_NAISSANCE_MIN;PRENOM;NOM;IDENTIFIANT_GASPARD;NUMERO_PERSONNE;NUMERO_SIGNALISATION
x;CL9;1/2;01/01/2020;01/01/1990;Ann;Lee;GN1;7;8
";
        let rows = parse_rows(csv, b';').unwrap();
        assert_eq!(rows[0].signalisation_id, "8");
        assert_eq!(rows[0].person_id, "7");
        assert_eq!(rows[0].idpp, "GN1");
        assert_eq!(rows[0].photo_ref, "CL9");
    }

    #[test]
    fn bom_and_padded_headers() {
        let csv = format!("\u{feff}{}\n1,1,GN1,A,B,C,D,E,F\n", HEADER.replace(',', " , "));
        let rows = parse_rows(&csv, b',').unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn comment_lines_are_skipped() {
        let csv = format!("# SIGNALISATIONS CONSERVEES\n#\n{HEADER}\n1,1,GN1,A,B,C,D,E,F\n");
        let rows = parse_rows(&csv, b',').unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn missing_column() {
        let csv = "NUMERO_SIGNALISATION,NUMERO_PERSONNE\n1,2\n";
        let err = parse_rows(csv, b',').unwrap_err();
        match err {
            DedupError::MissingColumn { column } => assert_eq!(column, IDENTIFIANT_GASPARD),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_inputs() {
        assert!(matches!(parse_rows("", b','), Err(DedupError::EmptyInput)));
        assert!(matches!(parse_rows("  \n", b','), Err(DedupError::EmptyInput)));
        let header_only = format!("{HEADER}\n");
        assert!(matches!(parse_rows(&header_only, b','), Err(DedupError::EmptyInput)));
    }

    #[test]
    fn empty_identity_code_rejected() {
        let csv = format!("{HEADER}\n1,1, ,A,B,C,D,E,F\n");
        let err = parse_rows(&csv, b',').unwrap_err();
        assert!(matches!(
            err,
            DedupError::EmptyField { line: 2, column: IDENTIFIANT_GASPARD }
        ));
    }

    #[test]
    fn duplicate_signalisation_rejected() {
        let csv = format!(
            "{HEADER}\n1,1,GN1,A,B,C,D,E,F\n2,1,GN1,A,B,C,D,E,F\n1,1,GN1,A,B,C,D,E,F\n"
        );
        let err = parse_rows(&csv, b',').unwrap_err();
        match err {
            DedupError::DuplicateSignalisationId { id, first_line, line } => {
                assert_eq!(id, "1");
                assert_eq!(first_line, 2);
                assert_eq!(line, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ragged_row_is_csv_error() {
        let csv = format!("{HEADER}\n1,1,GN1\n");
        let err = parse_rows(&csv, b',').unwrap_err();
        assert!(matches!(err, DedupError::Csv { .. }));
    }
}
