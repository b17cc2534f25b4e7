//! Campaign-finance transactions and donor aggregation results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::person::EntityId;

/// Disposition of a financial transaction. Only contributions participate in
/// donor aggregation; expenditures are ingested but filtered out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Contribution,
    Expenditure,
}

impl FromStr for Disposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contribution" | "c" => Ok(Disposition::Contribution),
            "expenditure" | "e" => Ok(Disposition::Expenditure),
            unknown => Err(format!("unknown disposition: {unknown}")),
        }
    }
}

/// One campaign-finance transaction as ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationTransaction {
    pub id: i64,
    pub donor_entity_id: EntityId,
    pub recipient_entity_id: EntityId,
    pub amount: f64,
    pub transaction_date: NaiveDate,
    pub disposition: Disposition,
    pub employer: Option<String>,
    pub occupation: Option<String>,

    /// Optional transaction-level embedding for similarity queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Aggregated identity for a transaction counterparty. Many transactions
/// share one donor entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorEntity {
    pub id: EntityId,
    pub name: String,
}

/// Per-donor aggregation over a filtered transaction set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorTotal {
    pub entity_id: EntityId,
    pub name: String,

    /// Sum of filtered contribution amounts for this donor in the window.
    pub total: f64,
    pub donation_count: usize,

    /// Statistical mode of non-empty employer values among this donor's
    /// filtered transactions.
    pub employer: Option<String>,
    pub occupation: Option<String>,

    /// Max cosine similarity against the optional query vector. `None` when
    /// no query vector was supplied or the donor has no embedded
    /// transactions; may be negative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_match: Option<f64>,
}
