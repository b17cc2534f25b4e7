//! `donorprobe window` - resolve the effective analysis window for sessions.

use anyhow::Result;
use clap::Args;

use crate::cli::AppContext;
use crate::domain::models::{Config, SessionWindow};
use crate::services::SessionWindowResolver;

#[derive(Args)]
pub struct WindowArgs {
    /// Session ids to resolve the combined window for
    #[arg(required = true)]
    pub session_ids: Vec<i64>,

    /// Days of padding before the earliest activity
    #[arg(long)]
    pub lead_days: Option<i64>,

    /// Days of padding after the latest activity
    #[arg(long)]
    pub lag_days: Option<i64>,
}

pub async fn execute(args: WindowArgs, config: Config, json: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let resolver = SessionWindowResolver::new(ctx.store.clone());
    let lead = args.lead_days.unwrap_or(ctx.config.window.lead_days);
    let lag = args.lag_days.unwrap_or(ctx.config.window.lag_days);

    let window = resolver.resolve(&args.session_ids, lead, lag).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&window)?);
    } else {
        match window {
            SessionWindow::Resolved { from_date, to_date } => {
                println!("Window: {from_date} to {to_date} (lead {lead}d, lag {lag}d)");
            }
            SessionWindow::Indeterminate => {
                println!("Window: indeterminate (no votes or session dates recorded)");
            }
        }
    }
    Ok(())
}
