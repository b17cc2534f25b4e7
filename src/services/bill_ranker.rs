//! Hybrid lexical + vector bill ranking.

use std::sync::Arc;
use tracing::debug;

use crate::domain::errors::EngineResult;
use crate::domain::models::{Bill, Person, RankedBill, RankingConfig, SessionId, Vote};
use crate::domain::ports::InvestigationStore;
use crate::services::outlier::detect_outlier;
use crate::services::similarity::{LexicalMatcher, SimilarityIndex};

/// A ranking query: free-text terms, donor-theme query vectors, and gates.
#[derive(Debug, Clone, Default)]
pub struct RankRequest {
    pub search_terms: Vec<String>,
    pub query_vectors: Vec<Vec<f32>>,
    pub similarity_threshold: Option<f64>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Scores bills against a legislator's voting history with a weighted blend
/// of lexical term matches and cosine similarity, gated so that every
/// returned bill has either a term hit or similarity above threshold.
pub struct BillRanker {
    store: Arc<dyn InvestigationStore>,
    config: RankingConfig,
    index: SimilarityIndex,
}

impl BillRanker {
    pub fn new(store: Arc<dyn InvestigationStore>, config: RankingConfig) -> Self {
        Self {
            store,
            config,
            index: SimilarityIndex,
        }
    }

    /// Rank the bills a person's legislators voted on within a session.
    pub async fn rank(
        &self,
        person: &Person,
        session_id: SessionId,
        request: &RankRequest,
    ) -> EngineResult<Vec<RankedBill>> {
        let threshold = request
            .similarity_threshold
            .unwrap_or(self.config.similarity_threshold);
        let limit = request.limit.unwrap_or(self.config.default_limit);
        let matcher = LexicalMatcher::new(&request.search_terms);

        let bills = self
            .store
            .bills_voted_by(&person.legislator_ids, session_id)
            .await?;
        debug!(
            person_id = person.id,
            session_id,
            candidates = bills.len(),
            "ranking candidate bills"
        );

        let mut ranked = Vec::new();
        for bill in &bills {
            let Some(scored) = self.score_bill(bill, &matcher, &request.query_vectors, threshold)
            else {
                continue;
            };
            let votes = self.store.votes_on_bill(bill.id).await?;
            ranked.push(self.annotate(bill, scored, &votes, person));
        }

        // Score descending, then introduction date descending with nulls
        // last, then bill id for a stable order.
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| match (a.introduced_on, b.introduced_on) {
                    (Some(x), Some(y)) => y.cmp(&x),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.bill_id.cmp(&b.bill_id))
        });

        Ok(ranked
            .into_iter()
            .skip(request.offset)
            .take(limit)
            .collect())
    }

    /// Blended score for one bill, or `None` when the bill fails the gate
    /// (neither a term hit nor similarity above threshold).
    fn score_bill(
        &self,
        bill: &Bill,
        matcher: &LexicalMatcher,
        query_vectors: &[Vec<f32>],
        threshold: f64,
    ) -> Option<(f64, bool, f64)> {
        let term_hit = matcher.matches_any(
            [
                bill.number.as_str(),
                bill.title.as_str(),
                bill.description.as_str(),
            ]
            .into_iter()
            .chain(bill.sponsors.iter().map(|s| s.name.as_str())),
        );

        let candidates: Vec<&[f32]> = [&bill.summary_embedding, &bill.fulltext_embedding]
            .into_iter()
            .flatten()
            .map(Vec::as_slice)
            .collect();
        let vec_score = if query_vectors.is_empty() || candidates.is_empty() {
            0.0
        } else {
            self.index.max_similarity(
                query_vectors.iter().map(Vec::as_slice),
                candidates.iter().copied(),
            )
        };

        // Low-confidence vector noise must not pollute keyword queries, and
        // vice versa: a bill needs at least one strong signal.
        if !term_hit && vec_score <= threshold {
            return None;
        }

        let score = self.config.term_weight * f64::from(u8::from(term_hit))
            + self.config.vector_weight * vec_score.clamp(0.0, 1.0);
        Some((score.clamp(0.0, 1.0), term_hit, vec_score))
    }

    fn annotate(
        &self,
        bill: &Bill,
        (score, term_hit, vec_score): (f64, bool, f64),
        votes: &[Vote],
        person: &Person,
    ) -> RankedBill {
        let target_vote = votes
            .iter()
            .filter(|v| person.legislator_ids.contains(&v.legislator_id))
            .max_by_key(|v| v.vote_date)
            .map(|v| v.value);
        let outlier = person
            .party
            .as_deref()
            .map(|party| detect_outlier(votes, &person.legislator_ids, party))
            .unwrap_or_default();

        RankedBill {
            bill_id: bill.id,
            number: bill.number.clone(),
            title: bill.title.clone(),
            introduced_on: bill.introduced_on,
            sponsors: bill.sponsors.iter().map(|s| s.name.clone()).collect(),
            score,
            term_hit,
            vec_score,
            target_vote,
            outlier,
        }
    }
}
