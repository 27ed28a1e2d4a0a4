use std::collections::HashMap;

use super::identity::IdentityPolicy;
use super::types::{
    Availability, ChangeEntry, ReconcileOptions, ReconcilePolicy, ReconciledEntry, SurveyResponse,
};

/// Groups responses by canonical identity and derives each identity's final
/// availability under the selected policy, plus the change report for
/// identities that submitted more than once.
///
/// Entries come back in first-seen identity order; within an identity,
/// responses are ordered by submission timestamp ascending with the original
/// row index as tie-break (rows without a timestamp sort before timestamped
/// ones, among themselves by row index).
pub fn reconcile(
    responses: Vec<SurveyResponse>,
    identity: IdentityPolicy,
    options: ReconcileOptions,
) -> (Vec<ReconciledEntry>, Vec<ChangeEntry>) {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<SurveyResponse>> = HashMap::new();

    for response in responses {
        let key = identity.resolve(&response.name, response.email.as_deref());
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(response);
    }

    let mut entries = Vec::with_capacity(order.len());
    let mut changes = Vec::new();

    for key in order {
        let mut group = groups.remove(&key).unwrap_or_default();
        group.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then(a.row_index.cmp(&b.row_index))
        });

        let entry = build_entry(key, group, options.policy);
        if let Some(change) = diff_latest(&entry) {
            if options.include_unchanged || !change.is_unchanged() {
                changes.push(change);
            }
        }
        entries.push(entry);
    }

    (entries, changes)
}

fn build_entry(key: String, group: Vec<SurveyResponse>, policy: ReconcilePolicy) -> ReconciledEntry {
    let mut aliases = std::collections::BTreeSet::new();
    for response in &group {
        let name = response.name.trim();
        if !name.is_empty() {
            aliases.insert(name.to_string());
        }
    }

    // Email-only rows have no display name; the key still identifies them.
    let mut display_name = group
        .last()
        .map(|r| r.name.trim().to_string())
        .unwrap_or_default();
    if display_name.is_empty() {
        display_name = key.clone();
    }

    let availability = match policy {
        ReconcilePolicy::Union => union_availability(&group),
        ReconcilePolicy::LatestWins => group
            .last()
            .map(|r| r.availability.clone())
            .unwrap_or_default(),
    };

    ReconciledEntry {
        key,
        display_name,
        aliases,
        responses: group,
        availability,
    }
}

/// Union of availability across a slice of responses, in any order.
pub fn union_availability(responses: &[SurveyResponse]) -> Availability {
    let mut all = Availability::new();
    for response in responses {
        all.extend(response.availability.iter().cloned());
    }
    all
}

/// Added/removed slots between the cumulative prior responses and the
/// latest one. Identities with a single response produce no entry at all,
/// which keeps "never changed" distinct from "only submitted once".
fn diff_latest(entry: &ReconciledEntry) -> Option<ChangeEntry> {
    if entry.responses.len() < 2 {
        return None;
    }

    let (latest, prior_responses) = entry.responses.split_last()?;
    let prior = union_availability(prior_responses);

    let added: Availability = latest.availability.difference(&prior).cloned().collect();
    let removed: Availability = prior.difference(&latest.availability).cloned().collect();

    Some(ChangeEntry {
        key: entry.key.clone(),
        display_name: entry.display_name.clone(),
        added,
        removed,
    })
}
