//! `donorprobe investigate` - run the full tool-calling investigation loop.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::AppContext;
use crate::domain::models::{Config, Termination};
use crate::infrastructure::llm::AnthropicClient;
use crate::services::{InvestigationLoop, ThemeSynthesizer, Toolkit};

#[derive(Args)]
pub struct InvestigateArgs {
    /// The question to investigate, e.g. "Did donors influence Smith's
    /// utility votes in the 2021 session?"
    pub question: String,

    /// Include the full step-by-step transcript in the output
    #[arg(long)]
    pub transcript: bool,
}

pub async fn execute(args: InvestigateArgs, config: Config, json: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let completion = Arc::new(
        AnthropicClient::from_env(ctx.config.llm.clone())
            .context("failed to construct completion client")?,
    );
    let synthesizer = ThemeSynthesizer::new(completion.clone());
    let toolkit = Arc::new(Toolkit::new(
        ctx.store.clone(),
        ctx.cache.clone(),
        synthesizer,
        ctx.config.clone(),
    ));
    let engine = InvestigationLoop::new(completion, toolkit, ctx.config.clone());

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, finishing with partial results");
            signal_token.cancel();
        }
    });

    let report = engine.run(&args.question, &cancel).await?;

    if json {
        if args.transcript {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!(
                "{}",
                serde_json::json!({
                    "answer": report.answer,
                    "termination": report.termination,
                    "steps": report.steps.len(),
                })
            );
        }
    } else {
        println!("{}", report.answer);
        match report.termination {
            Termination::Answered => {}
            Termination::BudgetExhausted => {
                println!("\n(note: the step budget ran out; this is a best-effort summary)");
            }
            Termination::Cancelled => {
                println!("\n(note: the investigation was interrupted; partial results only)");
            }
        }
        if args.transcript {
            println!("\nTranscript ({} steps):", report.steps.len());
            for step in &report.steps {
                println!("  step {}:", step.index);
                if let Some(text) = &step.assistant_text {
                    println!("    {text}");
                }
                for invocation in &step.invocations {
                    println!("    -> {} {}", invocation.tool, invocation.arguments);
                }
            }
        }
    }

    Ok(())
}
