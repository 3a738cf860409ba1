use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One validated input row: the nine mandatory columns as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// 0-based index among data rows.
    pub row: usize,
    /// Line in the source file (1-based, header included).
    pub line: u64,
    pub signalisation_id: String,
    pub person_id: String,
    pub idpp: String,
    pub last_name: String,
    pub first_name: String,
    pub birth_date_min: String,
    pub creation_date: String,
    pub procedure_ref: String,
    pub photo_ref: String,
}

/// Signalisation number. Orders numerically when both sides are numeric,
/// numeric ids before anything else, lexicographically otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SignalisationId(pub String);

impl SignalisationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn numeric(&self) -> Option<u128> {
        parse_number(&self.0)
    }
}

/// Digits only: `u128::from_str` alone would also accept a leading `+`.
pub(crate) fn parse_number(s: &str) -> Option<u128> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl Ord for SignalisationId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SignalisationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SignalisationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Derived fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyField {
    CreationDate,
    ProcedureRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Blank value.
    Missing,
    /// Non-blank value that matches none of the configured date formats.
    Unparsable,
    /// Non-blank value that does not have the expected structure.
    Malformed,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Unparsable => write!(f, "unparsable"),
            Self::Malformed => write!(f, "malformed"),
        }
    }
}

/// A derived value, or the fallback used in its place when the source field
/// could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Derived<T> {
    Value(T),
    Degraded { fallback: T, anomaly: AnomalyKind },
}

impl<T> Derived<T> {
    /// The value the resolver works with.
    pub fn get(&self) -> &T {
        match self {
            Self::Value(v) => v,
            Self::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn anomaly(&self) -> Option<AnomalyKind> {
        match self {
            Self::Value(_) => None,
            Self::Degraded { anomaly, .. } => Some(*anomaly),
        }
    }
}

/// Field-level anomaly absorbed while normalizing a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldAnomaly {
    pub signalisation_id: SignalisationId,
    pub line: u64,
    pub field: AnomalyField,
    pub kind: AnomalyKind,
    pub raw: String,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalisationRecord {
    pub signalisation_id: SignalisationId,
    pub person_id: String,
    pub idpp: String,
    pub last_name: String,
    pub first_name: String,
    pub birth_date_min: String,
    pub creation_date: String,
    pub procedure_ref: String,
    pub photo_ref: Option<String>,
    /// 0-based input row index.
    pub position: usize,
    pub line: u64,
    pub una: Derived<String>,
    pub creation: Derived<Option<NaiveDate>>,
    pub has_photo: bool,
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Normalized identity triple used by strict grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IdentityTriple {
    pub last_name: String,
    pub first_name: String,
    pub birth_date_min: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    pub idpp: String,
    pub person_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityTriple>,
}

/// Records sharing a [`GroupKey`], in first-seen order.
#[derive(Debug, Clone)]
pub struct IdentityGroup {
    pub key: GroupKey,
    pub members: Vec<SignalisationRecord>,
}

impl IdentityGroup {
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// 1-based ordinal of a duplicate group (two or more members).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GroupId(pub usize);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Rule that decided a record's fate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// No other signalisation shares the key.
    Unique,
    /// Tri 1: signalisation number equals the person number.
    SelfReferential,
    /// Tri 2: the procedure UNA appears in the IDPP.
    UnaConsistency,
    /// Tri 3.1: oldest creation date.
    OldestCreation,
    /// Tri 3.2: photo attached.
    PhotoPresence,
    /// Tri 3.3: lowest signalisation number.
    LowestSignalisationId,
}

impl Rule {
    pub const ALL: [Rule; 6] = [
        Rule::Unique,
        Rule::SelfReferential,
        Rule::UnaConsistency,
        Rule::OldestCreation,
        Rule::PhotoPresence,
        Rule::LowestSignalisationId,
    ];

    /// Short tier code ("Tri 1", "Tri 3.2", ...).
    pub fn tier(&self) -> &'static str {
        match self {
            Self::Unique => "-",
            Self::SelfReferential => "Tri 1",
            Self::UnaConsistency => "Tri 2",
            Self::OldestCreation => "Tri 3.1",
            Self::PhotoPresence => "Tri 3.2",
            Self::LowestSignalisationId => "Tri 3.3",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unique => write!(f, "unique"),
            Self::SelfReferential => write!(f, "self_referential"),
            Self::UnaConsistency => write!(f, "una_consistency"),
            Self::OldestCreation => write!(f, "oldest_creation"),
            Self::PhotoPresence => write!(f, "photo_presence"),
            Self::LowestSignalisationId => write!(f, "lowest_signalisation_id"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Kept,
    Deleted,
}

/// Outcome of one identity group. Exactly one survivor.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    pub key: GroupKey,
    pub rule: Rule,
    pub kept: SignalisationRecord,
    pub deleted: Vec<SignalisationRecord>,
}

/// A record with its verdict, as found in `conserved` / `to_delete`.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub record: SignalisationRecord,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    pub rule: Rule,
    /// Survivor of the record's group (the record itself when kept).
    pub kept_id: SignalisationId,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnomalyCounts {
    pub missing_creation_dates: usize,
    pub unparsable_creation_dates: usize,
    pub missing_procedure_refs: usize,
    pub malformed_procedure_refs: usize,
}

impl AnomalyCounts {
    pub fn total(&self) -> usize {
        self.missing_creation_dates
            + self.unparsable_creation_dates
            + self.missing_procedure_refs
            + self.malformed_procedure_refs
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupStats {
    pub total_input: usize,
    pub eligible: usize,
    pub excluded: usize,
    pub conserved: usize,
    pub conserved_pct: f64,
    pub to_delete: usize,
    pub to_delete_pct: f64,
    pub duplicate_groups: usize,
    /// Duplicate groups resolved by each rule.
    pub groups_by_rule: BTreeMap<Rule, usize>,
    /// Eligible records carrying each rule.
    pub records_by_rule: BTreeMap<Rule, usize>,
    /// Records per two-letter IDPP class prefix, whole input.
    pub class_counts: BTreeMap<String, usize>,
    pub anomalies: AnomalyCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupMeta {
    pub engine_version: String,
    pub excluded_prefix: String,
    pub strict_identity: bool,
    pub una_rule: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupResult {
    pub meta: DedupMeta,
    pub stats: DedupStats,
    pub conserved: Vec<Decision>,
    pub to_delete: Vec<Decision>,
    pub excluded: Vec<SignalisationRecord>,
    /// Duplicate groups only, in first-seen order.
    pub outcomes: Vec<ResolutionOutcome>,
    pub anomalies: Vec<FieldAnomaly>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signalisation_ids_order_numerically() {
        let mut ids = vec![
            SignalisationId::new("100"),
            SignalisationId::new("9"),
            SignalisationId::new("A7"),
            SignalisationId::new("10"),
        ];
        ids.sort();
        let ordered: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
        assert_eq!(ordered, vec!["9", "10", "100", "A7"]);
    }

    #[test]
    fn signed_ids_are_not_numeric() {
        assert_eq!(SignalisationId::new("+42").numeric(), None);
        assert_eq!(SignalisationId::new("-42").numeric(), None);
        assert_eq!(SignalisationId::new("0042").numeric(), Some(42));

        let mut ids = vec![SignalisationId::new("+1"), SignalisationId::new("5")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "5");
    }

    #[test]
    fn leading_zeros_break_numeric_ties() {
        let a = SignalisationId::new("0042");
        let b = SignalisationId::new("42");
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a.numeric(), b.numeric());
    }

    #[test]
    fn derived_fallback_is_used() {
        let d: Derived<String> = Derived::Degraded {
            fallback: String::new(),
            anomaly: AnomalyKind::Malformed,
        };
        assert_eq!(d.get(), "");
        assert_eq!(d.anomaly(), Some(AnomalyKind::Malformed));
        assert!(Derived::Value(3).anomaly().is_none());
    }
}
