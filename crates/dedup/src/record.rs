use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::config::{DedupConfig, UnaConfig, UnaRule};
use crate::model::{
    parse_number, AnomalyField, AnomalyKind, Derived, FieldAnomaly, IdentityTriple, RawRow,
    SignalisationId, SignalisationRecord,
};

/// `%Y` accepts one to four digits; shorter years are left to the `%y` formats.
const MIN_FOUR_DIGIT_YEAR: i32 = 1000;

impl SignalisationRecord {
    /// Normalize a raw row and derive UNA, creation date and photo presence.
    pub fn from_raw(raw: RawRow, config: &DedupConfig) -> Self {
        let una = extract_una(&raw.procedure_ref, &config.una);
        let creation = parse_creation_date(&raw.creation_date, &config.dates.formats);
        let photo_ref = normalize_photo_ref(&raw.photo_ref);

        Self {
            signalisation_id: SignalisationId::new(raw.signalisation_id.trim()),
            person_id: raw.person_id.trim().to_string(),
            idpp: raw.idpp.trim().to_string(),
            last_name: raw.last_name,
            first_name: raw.first_name,
            birth_date_min: raw.birth_date_min,
            creation_date: raw.creation_date,
            procedure_ref: raw.procedure_ref,
            has_photo: photo_ref.is_some(),
            photo_ref,
            position: raw.row,
            line: raw.line,
            una,
            creation,
        }
    }

    /// Tri 1 predicate: the signalisation created the person number.
    pub fn is_self_referential(&self) -> bool {
        same_number(self.signalisation_id.as_str(), &self.person_id)
    }

    /// Tri 2 predicate: the (non-empty) UNA appears in the record's own IDPP.
    pub fn una_in_idpp(&self) -> bool {
        let una = self.una.get();
        !una.is_empty() && self.idpp.contains(una.as_str())
    }

    pub fn creation_date_parsed(&self) -> Option<NaiveDate> {
        *self.creation.get()
    }

    /// Two-letter class prefix of the IDPP (shorter when the code is shorter).
    pub fn class_prefix(&self) -> &str {
        match self.idpp.char_indices().nth(2) {
            Some((end, _)) => &self.idpp[..end],
            None => &self.idpp,
        }
    }

    pub fn identity(&self) -> IdentityTriple {
        IdentityTriple {
            last_name: self.last_name.trim().to_uppercase(),
            first_name: self.first_name.trim().to_uppercase(),
            birth_date_min: self.birth_date_min.trim().to_string(),
        }
    }

    /// Field anomalies absorbed while deriving this record.
    pub fn anomalies(&self) -> Vec<FieldAnomaly> {
        let mut out = Vec::new();
        if let Some(kind) = self.creation.anomaly() {
            out.push(self.anomaly(AnomalyField::CreationDate, kind, &self.creation_date));
        }
        if let Some(kind) = self.una.anomaly() {
            out.push(self.anomaly(AnomalyField::ProcedureRef, kind, &self.procedure_ref));
        }
        out
    }

    fn anomaly(&self, field: AnomalyField, kind: AnomalyKind, raw: &str) -> FieldAnomaly {
        FieldAnomaly {
            signalisation_id: self.signalisation_id.clone(),
            line: self.line,
            field,
            kind,
            raw: raw.to_string(),
        }
    }
}

/// Numbers compare by value when both sides are numeric (`067890 == 67890`).
fn same_number(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => !a.is_empty() && a == b,
    }
}

/// Extract the UNA from a slash-delimited procedure reference.
///
/// The reference must have at least two non-empty ASCII alphanumeric
/// segments; anything else degrades to an empty UNA, which never matches.
pub fn extract_una(procedure_ref: &str, una: &UnaConfig) -> Derived<String> {
    let trimmed = procedure_ref.trim();
    if trimmed.is_empty() {
        return Derived::Degraded { fallback: String::new(), anomaly: AnomalyKind::Missing };
    }

    let segments: Vec<&str> = trimmed.split('/').map(str::trim).collect();
    let well_formed = segments.len() >= 2
        && segments
            .iter()
            .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()));
    if !well_formed {
        return malformed();
    }

    match una.rule {
        UnaRule::Concatenate => Derived::Value(segments.concat()),
        UnaRule::Segment => match segments.get(una.segment) {
            Some(segment) => Derived::Value(segment.to_string()),
            None => malformed(),
        },
    }
}

fn malformed() -> Derived<String> {
    Derived::Degraded { fallback: String::new(), anomaly: AnomalyKind::Malformed }
}

/// Parse a creation date with the configured formats, first match wins.
pub fn parse_creation_date(raw: &str, formats: &[String]) -> Derived<Option<NaiveDate>> {
    let s = raw.trim();
    if s.is_empty() {
        return Derived::Degraded { fallback: None, anomaly: AnomalyKind::Missing };
    }

    for fmt in formats {
        let parsed = NaiveDate::parse_from_str(s, fmt)
            .or_else(|_| NaiveDateTime::parse_from_str(s, fmt).map(|dt| dt.date()));
        match parsed {
            Ok(date) if !(fmt.contains("%Y") && date.year() < MIN_FOUR_DIGIT_YEAR) => {
                return Derived::Value(Some(date));
            }
            _ => continue,
        }
    }

    log::debug!("creation date '{s}' matches no configured format");
    Derived::Degraded { fallback: None, anomaly: AnomalyKind::Unparsable }
}

pub fn normalize_photo_ref(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
