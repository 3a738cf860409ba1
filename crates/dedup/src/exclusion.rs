use crate::model::SignalisationRecord;

/// Result of diverting the excluded IDPP class.
#[derive(Debug, Clone, Default)]
pub struct Exclusion {
    pub eligible: Vec<SignalisationRecord>,
    pub excluded: Vec<SignalisationRecord>,
}

pub fn is_excluded(idpp: &str, prefix: &str) -> bool {
    idpp.starts_with(prefix)
}

/// Split records into eligible and excluded, preserving input order in both.
pub fn partition_excluded(records: Vec<SignalisationRecord>, prefix: &str) -> Exclusion {
    let (excluded, eligible): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| is_excluded(&r.idpp, prefix));

    log::info!(
        "{} signalisations eligible, {} excluded (IDPP prefix '{prefix}')",
        eligible.len(),
        excluded.len()
    );

    Exclusion { eligible, excluded }
}
