//! Donor aggregation with majority-disposition filtering.

use std::collections::HashMap;

use crate::domain::models::{
    Disposition, DonationTransaction, DonorTotal, EntityId, SessionWindow,
};
use crate::services::similarity::SimilarityIndex;

/// Filters applied before grouping transactions by donor entity.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Temporal filter; `Indeterminate` applies none.
    pub window: SessionWindow,

    /// Minimum transaction amount to include.
    pub min_amount: f64,

    /// Optional similarity query vector; when present, donors with embedded
    /// transactions carry a `best_match` score and ordering switches to it.
    pub query_vector: Option<Vec<f32>>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            window: SessionWindow::Indeterminate,
            min_amount: 0.0,
            query_vector: None,
        }
    }
}

/// Statistical mode of non-empty values, with ties broken by the
/// first-encountered value in iteration order. Callable independent of the
/// backing store.
pub fn mode_of<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        let count = counts.entry(trimmed).or_insert(0);
        if *count == 0 {
            first_seen.push(trimmed);
        }
        *count += 1;
    }
    first_seen
        .iter()
        .max_by_key(|v| counts[*v])
        .map(|v| (*v).to_string())
}

/// Aggregate contribution transactions per donor entity.
///
/// Filters to contribution disposition, the date window, and the minimum
/// amount; sums totals and counts per donor; derives representative
/// employer/occupation tags by frequency mode. Idempotent: re-running over
/// unchanged data yields identical totals.
///
/// `donor_names` maps donor entity ids to display names; unknown donors get
/// an id-derived placeholder rather than being dropped.
pub fn aggregate_donors(
    transactions: &[DonationTransaction],
    donor_names: &HashMap<EntityId, String>,
    options: &AggregateOptions,
) -> Vec<DonorTotal> {
    let index = SimilarityIndex;
    let mut grouped: HashMap<EntityId, Vec<&DonationTransaction>> = HashMap::new();
    for tx in transactions {
        if tx.disposition != Disposition::Contribution {
            continue;
        }
        if !options.window.contains(tx.transaction_date) {
            continue;
        }
        if tx.amount < options.min_amount {
            continue;
        }
        grouped.entry(tx.donor_entity_id).or_default().push(tx);
    }

    let mut totals: Vec<DonorTotal> = grouped
        .into_iter()
        .map(|(entity_id, txs)| {
            let total: f64 = txs.iter().map(|t| t.amount).sum();
            let employer = mode_of(txs.iter().filter_map(|t| t.employer.as_deref()));
            let occupation = mode_of(txs.iter().filter_map(|t| t.occupation.as_deref()));
            // True maximum over the donor's embedded transactions; cosine
            // can be negative, so no zero floor. Donors with no embeddings
            // stay `None` rather than faking a score.
            let best_match = options.query_vector.as_deref().and_then(|query| {
                txs.iter()
                    .filter_map(|t| t.embedding.as_deref())
                    .map(|e| index.cosine(query, e))
                    .fold(None, |best: Option<f64>, score| {
                        Some(best.map_or(score, |b| b.max(score)))
                    })
            });
            let name = donor_names
                .get(&entity_id)
                .cloned()
                .unwrap_or_else(|| format!("entity #{entity_id}"));
            DonorTotal {
                entity_id,
                name,
                total,
                donation_count: txs.len(),
                employer,
                occupation,
                best_match,
            }
        })
        .collect();

    // best_match ordering when a query vector was supplied, with total as
    // the secondary key; plain total ordering otherwise. Donors without a
    // score sort after scored ones; entity id as the final key keeps the
    // output deterministic.
    totals.sort_by(|a, b| {
        let primary = match (a.best_match, b.best_match) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        primary
            .then_with(|| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    totals
}
