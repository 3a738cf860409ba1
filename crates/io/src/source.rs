// Register CSV input: encoding, delimiter, fingerprint

use std::path::Path;

use faed_dedup::loader::parse_rows;
use faed_dedup::RawRow;
use sha2::{Digest, Sha256};

use crate::error::IoError;

/// A loaded input file.
#[derive(Debug, Clone)]
pub struct InputTable {
    pub rows: Vec<RawRow>,
    pub delimiter: u8,
    /// `sha256:<hex>` of the file bytes as read from disk.
    pub fingerprint: String,
    /// Encoding the text was decoded from.
    pub encoding: &'static str,
}

/// Read and validate a register export.
///
/// With no `delimiter`, it is sniffed among tab, semicolon, comma and pipe.
pub fn read_table(path: &Path, delimiter: Option<u8>) -> Result<InputTable, IoError> {
    let bytes = std::fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let fingerprint = fingerprint(&bytes);
    let (content, encoding) = decode(bytes);
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));

    log::info!(
        "reading {} ({encoding}, delimiter {:?})",
        path.display(),
        delimiter as char
    );

    let rows = parse_rows(&content, delimiter).map_err(|source| IoError::Table {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(InputTable { rows, delimiter, fingerprint, encoding })
}

/// UTF-8, or Windows-1252 when the bytes are not valid UTF-8.
fn decode(bytes: Vec<u8>) -> (String, &'static str) {
    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => (s, "UTF-8"),
        Err(e) => {
            let bytes = e.into_bytes();
            // Registers exported from Excel are usually Windows-1252
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            (decoded.into_owned(), encoding_rs::WINDOWS_1252.name())
        }
    }
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins. `#` comment lines are skipped.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}'))
        .filter(|l| !l.starts_with('#') && !l.trim().is_empty())
        .take(10)
        .collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with the header, weighted by field count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// SHA-256 of raw bytes → "sha256:<64 hex>".
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("sha256:{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "NUMERO_SIGNALISATION;NUMERO_PERSONNE;IDENTIFIANT_GASPARD;NOM;PRENOM;DATE_NAISSANCE_MIN;DATE_CREATION_FAED;NUM_PROCEDURE;NUMERO_CLICHE";

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = format!("{HEADER}\n1;1;GN1;A;B;C;D;E;F\n");
        assert_eq!(sniff_delimiter(&content), b';');
    }

    #[test]
    fn test_sniff_comma_and_tab() {
        assert_eq!(sniff_delimiter(&HEADER.replace(';', ",")), b',');
        assert_eq!(sniff_delimiter(&HEADER.replace(';', "\t")), b'\t');
        assert_eq!(sniff_delimiter(&HEADER.replace(';', "|")), b'|');
    }

    #[test]
    fn test_sniff_skips_comment_header() {
        let content = format!("# SIGNALISATIONS CONSERVEES, rapport\n#\n{}\n", HEADER);
        assert_eq!(sniff_delimiter(&content), b';');
    }

    #[test]
    fn test_sniff_empty_defaults_to_comma() {
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_read_windows_1252() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        let mut bytes = format!("{HEADER}\n1;1;GN1;LEF").into_bytes();
        bytes.push(0xC8); // È in Windows-1252
        bytes.extend_from_slice(b"VRE;Ana;C;D;E;F\n");
        fs::write(&path, &bytes).unwrap();

        let table = read_table(&path, None).unwrap();
        assert_eq!(table.encoding, "windows-1252");
        assert_eq!(table.delimiter, b';');
        assert_eq!(table.rows[0].last_name, "LEFÈVRE");
        assert_eq!(table.fingerprint, fingerprint(&bytes));
    }

    #[test]
    fn test_read_utf8_with_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, format!("\u{feff}{HEADER}\n1;1;GN1;A;B;C;D;E;F\n")).unwrap();

        let table = read_table(&path, Some(b';')).unwrap();
        assert_eq!(table.encoding, "UTF-8");
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_invalid_table_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.csv");
        fs::write(&path, "NUMERO_SIGNALISATION;NOM\n1;A\n").unwrap();

        let err = read_table(&path, None).unwrap_err();
        assert!(matches!(err, IoError::Table { .. }));
        assert!(err.to_string().contains("short.csv"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_table(Path::new("/nonexistent/faed.csv"), None).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
    }

    #[test]
    fn test_fingerprint_format() {
        assert_eq!(
            fingerprint(b""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
