//! `donorprobe outlier` - party-outlier check for one vote.

use anyhow::{bail, Result};
use clap::Args;

use crate::cli::AppContext;
use crate::domain::models::Config;
use crate::services::{detect_outlier, party_tallies};

#[derive(Args)]
pub struct OutlierArgs {
    /// Bill number, e.g. "HB 1234"
    #[arg(long)]
    pub bill: String,

    /// Canonical person whose vote is checked
    #[arg(long)]
    pub person_id: i64,
}

pub async fn execute(args: OutlierArgs, config: Config, json: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;

    let Some(person) = ctx.store.get_person(args.person_id).await? else {
        bail!("no person with id {}", args.person_id);
    };
    let Some(party) = person.party.as_deref() else {
        bail!("person {} has no recorded party affiliation", person.display_name);
    };
    let Some(bill) = ctx.store.get_bill_by_number(&args.bill).await? else {
        bail!("no bill numbered {}", args.bill);
    };

    let votes = ctx.store.votes_on_bill(bill.id).await?;
    let verdict = detect_outlier(&votes, &person.legislator_ids, party);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "bill": bill.number,
                "person": person.display_name,
                "party": party,
                "verdict": verdict,
            }))?
        );
    } else {
        if verdict.is_outlier {
            println!(
                "{} voted AGAINST the {} majority on {} ({})",
                person.display_name,
                party,
                bill.number,
                verdict.breakdown.as_deref().unwrap_or("")
            );
        } else {
            println!(
                "{} did not vote against the {} majority on {}",
                person.display_name, party, bill.number
            );
        }
        for (tally_party, (yeas, nays)) in party_tallies(&votes) {
            println!("  {tally_party}: {yeas}Y/{nays}N");
        }
    }
    Ok(())
}
