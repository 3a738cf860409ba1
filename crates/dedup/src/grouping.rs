use std::collections::HashMap;

use crate::model::{GroupKey, IdentityGroup, SignalisationRecord};

impl GroupKey {
    pub fn for_record(record: &SignalisationRecord, strict_identity: bool) -> Self {
        Self {
            idpp: record.idpp.clone(),
            person_id: record.person_id.clone(),
            identity: strict_identity.then(|| record.identity()),
        }
    }
}

/// Group eligible records by key. Groups and members keep first-seen order.
pub fn group_records(
    records: Vec<SignalisationRecord>,
    strict_identity: bool,
) -> Vec<IdentityGroup> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<IdentityGroup> = Vec::new();

    for record in records {
        let key = GroupKey::for_record(&record, strict_identity);
        match index.get(&key) {
            Some(&i) => groups[i].members.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(IdentityGroup { key, members: vec![record] });
            }
        }
    }

    let duplicates = groups.iter().filter(|g| !g.is_singleton()).count();
    log::info!("{} identity groups, {duplicates} with duplicates", groups.len());

    groups
}
