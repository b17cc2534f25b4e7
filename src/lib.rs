//! donorprobe: a legislative conflict-of-interest investigation engine.
//!
//! Links campaign-donation records to legislator voting behavior through an
//! LLM-driven, budget-bounded tool-calling loop over a read-only ingestion
//! database. The analysis primitives (session windows, party-outlier
//! detection, donor aggregation, hybrid bill ranking) are deterministic and
//! usable without the LLM; the loop composes them.

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;
