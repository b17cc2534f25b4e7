//! `donorprobe donors` - aggregate contributions to a person or entities.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Args;
use std::collections::HashMap;

use crate::cli::AppContext;
use crate::domain::models::{Config, SessionWindow};
use crate::services::{aggregate_donors, AggregateOptions, SessionWindowResolver};

#[derive(Args)]
pub struct DonorsArgs {
    /// Canonical person id; their controlled entities receive the donations
    #[arg(long, conflicts_with = "entity_ids")]
    pub person_id: Option<i64>,

    /// Explicit recipient entity ids
    #[arg(long, value_delimiter = ',')]
    pub entity_ids: Vec<i64>,

    /// Sessions whose resolved window filters the transactions
    #[arg(long, value_delimiter = ',')]
    pub session_ids: Vec<i64>,

    /// Explicit window start, overriding session resolution
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Explicit window end, overriding session resolution
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Minimum contribution amount to include
    #[arg(long, default_value_t = 0.0)]
    pub min_amount: f64,
}

pub async fn execute(args: DonorsArgs, config: Config, json: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;

    let mut recipient_ids = args.entity_ids.clone();
    if let Some(person_id) = args.person_id {
        match ctx.store.get_person(person_id).await? {
            Some(person) => recipient_ids.extend(person.entity_ids),
            None => bail!("no person with id {person_id}"),
        }
    }
    if recipient_ids.is_empty() {
        bail!("provide --person-id or --entity-ids");
    }
    recipient_ids.sort_unstable();
    recipient_ids.dedup();

    let window = match (args.from, args.to) {
        (Some(from_date), Some(to_date)) => SessionWindow::Resolved { from_date, to_date },
        _ if !args.session_ids.is_empty() => {
            SessionWindowResolver::new(ctx.store.clone())
                .resolve(
                    &args.session_ids,
                    ctx.config.window.lead_days,
                    ctx.config.window.lag_days,
                )
                .await?
        }
        _ => SessionWindow::Indeterminate,
    };

    let transactions = ctx.store.transactions_for_recipients(&recipient_ids).await?;
    let donor_ids: Vec<i64> = transactions.iter().map(|t| t.donor_entity_id).collect();
    let donor_names: HashMap<i64, String> = ctx
        .store
        .donor_entities(&donor_ids)
        .await?
        .into_iter()
        .map(|e| (e.id, e.name))
        .collect();

    let totals = aggregate_donors(
        &transactions,
        &donor_names,
        &AggregateOptions {
            window,
            min_amount: args.min_amount,
            query_vector: None,
        },
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
    } else if totals.is_empty() {
        println!("No matching contributions.");
    } else {
        for total in &totals {
            let tags = [total.employer.as_deref(), total.occupation.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "{:>12.2}  {:<40} {:>4} donation(s)  {}",
                total.total, total.name, total.donation_count, tags
            );
        }
    }
    Ok(())
}
