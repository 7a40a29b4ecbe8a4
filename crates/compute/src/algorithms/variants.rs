use indexmap::IndexMap;
use tracing::debug;

use varscope_core::{CaseId, Event, Variant, VariantCount};

/// Group events into one activity sequence per case.
///
/// Events inside a case are ordered by timestamp; events sharing a timestamp
/// keep their log order. Cases are returned in first-seen order.
pub fn build_case_sequences(events: &[Event]) -> IndexMap<CaseId, Variant> {
    let mut grouped: IndexMap<CaseId, Vec<&Event>> = IndexMap::new();
    for event in events {
        grouped.entry(event.case_id.clone()).or_default().push(event);
    }

    grouped
        .into_iter()
        .map(|(case_id, mut case_events)| {
            case_events.sort_by_key(|e| e.timestamp);
            let variant = Variant::new(case_events.iter().map(|e| e.activity.as_str()));
            (case_id, variant)
        })
        .collect()
}

/// Count distinct case sequences and rank them by descending frequency.
///
/// Equal frequencies keep the order in which the variant was first seen, so
/// the output is a valid input for [`crate::algorithms::coverage::select`].
pub fn extract_variants(events: &[Event]) -> Vec<VariantCount> {
    let sequences = build_case_sequences(events);

    let mut counts: IndexMap<Variant, u64> = IndexMap::new();
    for variant in sequences.into_values() {
        *counts.entry(variant).or_insert(0) += 1;
    }

    let mut ranked: Vec<VariantCount> = counts
        .into_iter()
        .map(|(variant, frequency)| VariantCount { variant, frequency })
        .collect();
    // Stable sort: ties stay in first-seen order.
    ranked.sort_by(|a, b| b.frequency.cmp(&a.frequency));

    debug!(events = events.len(), variants = ranked.len(), "variants extracted");
    ranked
}
