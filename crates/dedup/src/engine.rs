use rayon::prelude::*;

use crate::aggregate::aggregate;
use crate::config::DedupConfig;
use crate::error::DedupError;
use crate::exclusion::partition_excluded;
use crate::grouping::group_records;
use crate::model::{DedupMeta, DedupResult, FieldAnomaly, GroupId, RawRow, SignalisationRecord};
use crate::resolver::resolve_group;

/// Run duplicate resolution over loaded rows.
pub fn run(config: &DedupConfig, rows: Vec<RawRow>) -> Result<DedupResult, DedupError> {
    config.validate()?;
    let records = rows
        .into_iter()
        .map(|raw| SignalisationRecord::from_raw(raw, config))
        .collect();
    Ok(resolve_all(config, records))
}

/// Run duplicate resolution over already-normalized records.
pub fn run_records(
    config: &DedupConfig,
    records: Vec<SignalisationRecord>,
) -> Result<DedupResult, DedupError> {
    config.validate()?;
    Ok(resolve_all(config, records))
}

fn resolve_all(config: &DedupConfig, records: Vec<SignalisationRecord>) -> DedupResult {
    let exclusion = partition_excluded(records, &config.excluded_prefix);

    let anomalies: Vec<FieldAnomaly> =
        exclusion.eligible.iter().flat_map(|r| r.anomalies()).collect();
    for a in &anomalies {
        log::debug!(
            "line {}: signalisation {} has {} {:?} ('{}')",
            a.line,
            a.signalisation_id,
            a.kind,
            a.field,
            a.raw
        );
    }

    let groups = group_records(exclusion.eligible, config.strict_identity);

    // Duplicate groups are numbered in first-seen order before fan-out.
    let mut next_id = 0;
    let numbered: Vec<_> = groups
        .into_iter()
        .map(|group| {
            let id = if group.is_singleton() {
                None
            } else {
                next_id += 1;
                Some(GroupId(next_id))
            };
            (group, id)
        })
        .collect();

    let outcomes: Vec<_> = if config.parallel {
        numbered
            .into_par_iter()
            .map(|(group, id)| resolve_group(group, id))
            .collect()
    } else {
        numbered
            .into_iter()
            .map(|(group, id)| resolve_group(group, id))
            .collect()
    };

    let meta = DedupMeta {
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        excluded_prefix: config.excluded_prefix.clone(),
        strict_identity: config.strict_identity,
        una_rule: config.una.to_string(),
    };

    let result = aggregate(meta, outcomes, exclusion.excluded, anomalies);
    let stats = &result.stats;

    log::info!(
        "{} conserved ({:.1}%), {} to delete ({:.1}%), {} excluded, {} duplicate groups",
        stats.conserved,
        stats.conserved_pct,
        stats.to_delete,
        stats.to_delete_pct,
        stats.excluded,
        stats.duplicate_groups
    );
    for (rule, count) in &stats.groups_by_rule {
        log::info!("{} ({rule}): {count} groups", rule.tier());
    }
    if stats.anomalies.total() > 0 {
        log::warn!(
            "field anomalies: {} missing creation dates, {} unparsable creation dates, \
             {} missing procedure refs, {} malformed procedure refs",
            stats.anomalies.missing_creation_dates,
            stats.anomalies.unparsable_creation_dates,
            stats.anomalies.missing_procedure_refs,
            stats.anomalies.malformed_procedure_refs
        );
    }

    result
}
