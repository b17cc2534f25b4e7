//! `donorprobe rank` - hybrid lexical + vector bill ranking.

use anyhow::{bail, Result};
use clap::Args;

use crate::cli::AppContext;
use crate::domain::models::Config;
use crate::services::{BillRanker, RankRequest};

#[derive(Args)]
pub struct RankArgs {
    /// Canonical person whose voting history anchors the ranking
    #[arg(long)]
    pub person_id: i64,

    /// Session to rank bills within
    #[arg(long)]
    pub session_id: i64,

    /// Search terms matched against number, title, description, and sponsors
    #[arg(long, value_delimiter = ',')]
    pub terms: Vec<String>,

    /// Similarity gate override in [0, 1]
    #[arg(long)]
    pub threshold: Option<f64>,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

pub async fn execute(args: RankArgs, config: Config, json: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let Some(person) = ctx.store.get_person(args.person_id).await? else {
        bail!("no person with id {}", args.person_id);
    };

    let ranker = BillRanker::new(ctx.store.clone(), ctx.config.ranking.clone());
    let request = RankRequest {
        search_terms: args.terms,
        query_vectors: Vec::new(),
        similarity_threshold: args.threshold,
        limit: args.limit,
        offset: args.offset,
    };
    let ranked = ranker.rank(&person, args.session_id, &request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else if ranked.is_empty() {
        println!("No bills passed the relevance gate.");
    } else {
        for bill in &ranked {
            let vote = bill
                .target_vote
                .map_or("-", |v| v.as_str());
            let outlier = if bill.outlier.is_outlier {
                format!(
                    "  OUTLIER ({})",
                    bill.outlier.breakdown.as_deref().unwrap_or("")
                )
            } else {
                String::new()
            };
            println!(
                "{:.3}  {:<10} {:<60} vote: {}{}",
                bill.score, bill.number, bill.title, vote, outlier
            );
        }
    }
    Ok(())
}
