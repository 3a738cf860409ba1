use std::collections::BTreeMap;

use crate::model::{
    AnomalyCounts, AnomalyField, AnomalyKind, Decision, DedupMeta, DedupResult, DedupStats,
    FieldAnomaly, ResolutionOutcome, Rule, SignalisationRecord, Verdict,
};

/// Combine resolved groups and the excluded set into the final partition.
///
/// `outcomes` must be in group first-seen order; `conserved` and `to_delete`
/// follow that order, members in input order.
pub fn aggregate(
    meta: DedupMeta,
    outcomes: Vec<ResolutionOutcome>,
    excluded: Vec<SignalisationRecord>,
    anomalies: Vec<FieldAnomaly>,
) -> DedupResult {
    let mut conserved = Vec::with_capacity(outcomes.len());
    let mut to_delete = Vec::new();
    let mut duplicates = Vec::new();

    for outcome in outcomes {
        conserved.push(Decision {
            record: outcome.kept.clone(),
            verdict: Verdict::Kept,
            group: outcome.group,
            rule: outcome.rule,
            kept_id: outcome.kept.signalisation_id.clone(),
        });
        for record in &outcome.deleted {
            to_delete.push(Decision {
                record: record.clone(),
                verdict: Verdict::Deleted,
                group: outcome.group,
                rule: outcome.rule,
                kept_id: outcome.kept.signalisation_id.clone(),
            });
        }
        if outcome.group.is_some() {
            duplicates.push(outcome);
        }
    }

    let stats = compute_stats(&conserved, &to_delete, &duplicates, &excluded, &anomalies);

    DedupResult {
        meta,
        stats,
        conserved,
        to_delete,
        excluded,
        outcomes: duplicates,
        anomalies,
    }
}

/// Summary statistics. Percentages are over eligible records.
pub fn compute_stats(
    conserved: &[Decision],
    to_delete: &[Decision],
    duplicate_groups: &[ResolutionOutcome],
    excluded: &[SignalisationRecord],
    anomalies: &[FieldAnomaly],
) -> DedupStats {
    let eligible = conserved.len() + to_delete.len();

    let mut groups_by_rule: BTreeMap<Rule, usize> = Rule::ALL
        .iter()
        .filter(|r| **r != Rule::Unique)
        .map(|r| (*r, 0))
        .collect();
    for outcome in duplicate_groups {
        *groups_by_rule.entry(outcome.rule).or_insert(0) += 1;
    }

    let mut records_by_rule: BTreeMap<Rule, usize> = Rule::ALL.iter().map(|r| (*r, 0)).collect();
    for decision in conserved.iter().chain(to_delete) {
        *records_by_rule.entry(decision.rule).or_insert(0) += 1;
    }

    let mut class_counts: BTreeMap<String, usize> = BTreeMap::new();
    let eligible_records = conserved.iter().chain(to_delete).map(|d| &d.record);
    for record in eligible_records.chain(excluded) {
        *class_counts.entry(record.class_prefix().to_string()).or_insert(0) += 1;
    }

    DedupStats {
        total_input: eligible + excluded.len(),
        eligible,
        excluded: excluded.len(),
        conserved: conserved.len(),
        conserved_pct: percentage(conserved.len(), eligible),
        to_delete: to_delete.len(),
        to_delete_pct: percentage(to_delete.len(), eligible),
        duplicate_groups: duplicate_groups.len(),
        groups_by_rule,
        records_by_rule,
        class_counts,
        anomalies: count_anomalies(anomalies),
    }
}

pub fn count_anomalies(anomalies: &[FieldAnomaly]) -> AnomalyCounts {
    let mut counts = AnomalyCounts::default();
    for a in anomalies {
        match (a.field, a.kind) {
            (AnomalyField::CreationDate, AnomalyKind::Missing) => {
                counts.missing_creation_dates += 1
            }
            (AnomalyField::CreationDate, _) => counts.unparsable_creation_dates += 1,
            (AnomalyField::ProcedureRef, AnomalyKind::Missing) => {
                counts.missing_procedure_refs += 1
            }
            (AnomalyField::ProcedureRef, _) => counts.malformed_procedure_refs += 1,
        }
    }
    counts
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
