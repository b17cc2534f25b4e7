//! Bills, sponsors, and ranked bill results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::person::LegislatorId;
use super::session::SessionId;
use super::vote::{OutlierVerdict, VoteValue};

/// Bill identifier.
pub type BillId = i64;

/// A bill sponsor as recorded by the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sponsor {
    pub legislator_id: LegislatorId,
    pub name: String,
}

/// A bill with its text fields and precomputed embedding vectors.
///
/// Embeddings are fixed-dimension float arrays produced upstream; the engine
/// only reads them for cosine-similarity scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub session_id: SessionId,
    pub number: String,
    pub title: String,
    pub description: String,
    pub introduced_on: Option<NaiveDate>,
    pub sponsors: Vec<Sponsor>,

    /// Summary-level embedding, when the summary has been embedded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_embedding: Option<Vec<f32>>,

    /// Full-text-level embedding, when the full text has been embedded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulltext_embedding: Option<Vec<f32>>,
}

/// One entry in a hybrid ranking result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedBill {
    pub bill_id: BillId,
    pub number: String,
    pub title: String,
    pub introduced_on: Option<NaiveDate>,
    pub sponsors: Vec<String>,

    /// Blended lexical + vector score in [0, 1].
    pub score: f64,
    pub term_hit: bool,
    pub vec_score: f64,

    /// The target legislator's latest vote on this bill, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_vote: Option<VoteValue>,
    pub outlier: OutlierVerdict,
}
