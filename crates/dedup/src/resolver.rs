//! Tie-break policy: exactly one survivor per identity group.
//!
//! Tri 1 and Tri 2 decide only when exactly one member qualifies; otherwise
//! the next rule runs over the whole group. Tri 3 is a composite key
//! (oldest date, then photo, then lowest number) evaluated component by
//! component, each one narrowing the ties left by the previous.

use chrono::NaiveDate;

use crate::model::{GroupId, IdentityGroup, ResolutionOutcome, Rule, SignalisationRecord};

/// Resolve one group. Singletons are kept with [`Rule::Unique`].
pub fn resolve_group(group: IdentityGroup, group_id: Option<GroupId>) -> ResolutionOutcome {
    let (winner, rule) = select_survivor(&group.members);

    // Vec::remove keeps the remaining members in input order.
    let mut deleted = group.members;
    let kept = deleted.remove(winner);

    if let Some(id) = group_id {
        log::debug!(
            "group {id} (IDPP {}, person {}): kept {} by {} ({}), {} deleted",
            group.key.idpp,
            group.key.person_id,
            kept.signalisation_id,
            rule,
            rule.tier(),
            deleted.len()
        );
    }

    ResolutionOutcome { group: group_id, key: group.key, rule, kept, deleted }
}

/// Index of the survivor among `members` and the rule that chose it.
pub fn select_survivor(members: &[SignalisationRecord]) -> (usize, Rule) {
    if members.len() <= 1 {
        return (0, Rule::Unique);
    }

    // Tri 1
    if let Some(only) = single(members, SignalisationRecord::is_self_referential) {
        return (only, Rule::SelfReferential);
    }

    // Tri 2
    if let Some(only) = single(members, SignalisationRecord::una_in_idpp) {
        return (only, Rule::UnaConsistency);
    }

    let mut candidates: Vec<usize> = (0..members.len()).collect();

    // Tri 3.1: a missing date ranks after every real date.
    let rank = |i: usize| -> (bool, Option<NaiveDate>) {
        let date = members[i].creation_date_parsed();
        (date.is_none(), date)
    };
    if let Some(best) = candidates.iter().map(|&i| rank(i)).min() {
        candidates.retain(|&i| rank(i) == best);
    }
    if let [only] = candidates[..] {
        return (only, Rule::OldestCreation);
    }

    // Tri 3.2
    candidates = narrow(candidates, |i| members[i].has_photo);
    if let [only] = candidates[..] {
        return (only, Rule::PhotoPresence);
    }

    // Tri 3.3: ids are unique, position only matters on corrupt input.
    let winner = candidates
        .iter()
        .copied()
        .min_by(|&a, &b| {
            members[a]
                .signalisation_id
                .cmp(&members[b].signalisation_id)
                .then(members[a].position.cmp(&members[b].position))
        })
        .unwrap_or(candidates[0]);
    debug_assert!(
        candidates
            .iter()
            .filter(|&&i| members[i].signalisation_id == members[winner].signalisation_id)
            .count()
            == 1,
        "duplicate signalisation id {} reached the resolver",
        members[winner].signalisation_id
    );
    (winner, Rule::LowestSignalisationId)
}

/// Index of the only member satisfying `qualifies`, if exactly one does.
fn single(
    members: &[SignalisationRecord],
    qualifies: impl Fn(&SignalisationRecord) -> bool,
) -> Option<usize> {
    let mut hits = members.iter().enumerate().filter(|(_, m)| qualifies(*m)).map(|(i, _)| i);
    match (hits.next(), hits.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// Keep the qualifying candidates, unless none or all of them qualify.
fn narrow(candidates: Vec<usize>, qualifies: impl Fn(usize) -> bool) -> Vec<usize> {
    let hits: Vec<usize> = candidates.iter().copied().filter(|&i| qualifies(i)).collect();
    if hits.is_empty() || hits.len() == candidates.len() {
        candidates
    } else {
        hits
    }
}
