//! Report wording for rules and groups. Report texts are in French, the
//! language of the register operators.

use faed_dedup::model::{Decision, GroupId, Rule, Verdict};

pub const NO_GROUP: &str = "Aucun";

/// `ID_GROUPE` column value.
pub fn group_label(group: Option<GroupId>) -> String {
    match group {
        Some(id) => format!("Groupe_{id}"),
        None => NO_GROUP.to_string(),
    }
}

/// `REGLE_APPLIQUEE` column value.
pub fn rule_label(rule: Rule) -> &'static str {
    match rule {
        Rule::Unique => "Signalisation unique",
        Rule::SelfReferential => "Tri 1 - Signalisation de création",
        Rule::UnaConsistency => "Tri 2 - UNA cohérente avec l'IDPP",
        Rule::OldestCreation => "Tri 3.1 - Date de création la plus ancienne",
        Rule::PhotoPresence => "Tri 3.2 - Présence d'une photo",
        Rule::LowestSignalisationId => "Tri 3.3 - Plus petit numéro de signalisation",
    }
}

fn rule_reason(rule: Rule) -> &'static str {
    match rule {
        Rule::Unique => "aucune autre signalisation pour ce couple IDPP / personne",
        Rule::SelfReferential => "numéro de signalisation égal au numéro de personne",
        Rule::UnaConsistency => "UNA de la procédure présente dans l'IDPP",
        Rule::OldestCreation => "date de création la plus ancienne du groupe",
        Rule::PhotoPresence => "photo présente, dates de création identiques",
        Rule::LowestSignalisationId => "plus petit numéro de signalisation, autres critères identiques",
    }
}

/// `DETAIL_REGLE` column value.
pub fn rule_detail(decision: &Decision) -> String {
    let reason = rule_reason(decision.rule);
    match decision.verdict {
        Verdict::Kept => format!("Conservée: {reason}"),
        Verdict::Deleted => format!("Supprimée au profit de {}: {reason}", decision.kept_id),
    }
}
