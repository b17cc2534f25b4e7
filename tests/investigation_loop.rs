//! End-to-end tests of the bounded tool-calling loop against an in-memory
//! store and a scripted completion provider.

mod common;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use common::{person, text_reply, tool_reply, MemoryStore, ScriptedProvider};
use donorprobe::domain::models::{Config, InvocationOutcome, Termination};
use donorprobe::domain::ports::{CompletionError, CompletionProvider};
use donorprobe::services::{InvestigationLoop, QueryCache, ThemeSynthesizer, Toolkit};

fn engine_with(
    store: MemoryStore,
    provider: Arc<ScriptedProvider>,
    config: Config,
) -> InvestigationLoop {
    let store: Arc<dyn donorprobe::domain::ports::InvestigationStore> = Arc::new(store);
    let clock = Arc::new(donorprobe::domain::ports::SystemClock);
    let cache = Arc::new(QueryCache::new(clock));
    let synthesizer = ThemeSynthesizer::new(provider.clone() as Arc<dyn CompletionProvider>);
    let toolkit = Arc::new(Toolkit::new(store, cache, synthesizer, config.clone()));
    InvestigationLoop::new(provider, toolkit, config)
}

fn seeded_store() -> MemoryStore {
    MemoryStore {
        persons: vec![person(1, "Alex Smith", "R")],
        ..MemoryStore::default()
    }
}

#[tokio::test]
async fn immediate_final_answer_terminates_answered() {
    let provider = Arc::new(ScriptedProvider::new(vec![text_reply("No conflict found.")]));
    let engine = engine_with(seeded_store(), provider.clone(), Config::default());

    let report = engine
        .run("Any conflicts for Smith?", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::Answered);
    assert_eq!(report.answer, "No conflict found.");
    assert_eq!(report.steps.len(), 1);
    assert_eq!(provider.calls_made(), 1);
}

#[tokio::test]
async fn tool_calls_are_dispatched_and_fed_back() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_reply(vec![(
            "tu_1",
            "resolve_person",
            serde_json::json!({"name": "Smith"}),
        )]),
        text_reply("Resolved to Alex Smith."),
    ]));
    let engine = engine_with(seeded_store(), provider.clone(), Config::default());

    let report = engine
        .run("Who is Smith?", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::Answered);
    assert_eq!(report.steps.len(), 2);
    let invocation = &report.steps[0].invocations[0];
    assert_eq!(invocation.tool, "resolve_person");
    match &invocation.outcome {
        InvocationOutcome::Result(value) => {
            assert_eq!(value["persons"][0]["display_name"], "Alex Smith");
        }
        InvocationOutcome::Error(e) => panic!("expected success, got {e}"),
    }
}

#[tokio::test]
async fn step_budget_exhaustion_forces_summary_without_tools() {
    let mut config = Config::default();
    config.budget.max_steps = 2;

    // Two reasoning steps with tool calls, then the forced summary turn.
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_reply(vec![(
            "tu_1",
            "resolve_person",
            serde_json::json!({"name": "Smith"}),
        )]),
        tool_reply(vec![(
            "tu_2",
            "resolve_person",
            serde_json::json!({"name": "Smith"}),
        )]),
        text_reply("Partial findings summary."),
    ]));
    let engine = engine_with(seeded_store(), provider.clone(), config);

    let report = engine
        .run("Investigate Smith", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::BudgetExhausted);
    assert_eq!(report.answer, "Partial findings summary.");
    assert_eq!(report.steps.len(), 2);
    // The summarization turn must offer no tools.
    let tool_counts = provider.tool_counts.lock().unwrap().clone();
    assert_eq!(tool_counts.len(), 3);
    assert!(tool_counts[0] > 0);
    assert_eq!(*tool_counts.last().unwrap(), 0);
}

#[tokio::test]
async fn roundtrip_budget_exhaustion_forces_summary() {
    let mut config = Config::default();
    config.budget.max_roundtrips = 1;

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_reply(vec![(
            "tu_1",
            "resolve_person",
            serde_json::json!({"name": "Smith"}),
        )]),
        tool_reply(vec![(
            "tu_2",
            "resolve_person",
            serde_json::json!({"name": "Smith"}),
        )]),
        text_reply("Out of round-trips."),
    ]));
    let engine = engine_with(seeded_store(), provider, config);

    let report = engine
        .run("Investigate Smith", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::BudgetExhausted);
    assert_eq!(report.answer, "Out of round-trips.");
    // The second step's requested calls were never dispatched.
    assert!(report.steps[1].invocations.is_empty());
}

#[tokio::test]
async fn invalid_tool_arguments_feed_an_error_back() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_reply(vec![(
            "tu_1",
            "resolve_person",
            serde_json::json!({"wrong_field": true}),
        )]),
        text_reply("Corrected course."),
    ]));
    let engine = engine_with(seeded_store(), provider, Config::default());

    let report = engine
        .run("Investigate Smith", &CancellationToken::new())
        .await
        .unwrap();

    // The loop survived the bad call and the model answered next turn.
    assert_eq!(report.termination, Termination::Answered);
    assert!(matches!(
        report.steps[0].invocations[0].outcome,
        InvocationOutcome::Error(_)
    ));
}

#[tokio::test]
async fn unknown_tool_is_rejected_not_fatal() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_reply(vec![("tu_1", "drop_tables", serde_json::json!({}))]),
        text_reply("Understood, that tool does not exist."),
    ]));
    let engine = engine_with(seeded_store(), provider, Config::default());

    let report = engine
        .run("Investigate Smith", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.termination, Termination::Answered);
}

#[tokio::test]
async fn pre_cancelled_token_summarizes_immediately() {
    let provider = Arc::new(ScriptedProvider::new(vec![text_reply(
        "Nothing gathered yet.",
    )]));
    let engine = engine_with(seeded_store(), provider.clone(), Config::default());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = engine.run("Investigate Smith", &cancel).await.unwrap();

    assert_eq!(report.termination, Termination::Cancelled);
    // Only the forced summary turn ran, with no tools offered.
    assert_eq!(*provider.tool_counts.lock().unwrap(), vec![0]);
}

#[tokio::test]
async fn failed_summary_turn_degrades_to_recap() {
    let mut config = Config::default();
    config.budget.max_steps = 1;

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_reply(vec![(
            "tu_1",
            "resolve_person",
            serde_json::json!({"name": "Smith"}),
        )]),
        Err(CompletionError::Fatal("provider down".to_string())),
    ]));
    let engine = engine_with(seeded_store(), provider, config);

    let report = engine
        .run("Investigate Smith", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::BudgetExhausted);
    assert!(report.answer.contains("ended early"));
    assert_eq!(report.steps.len(), 1);
}

#[tokio::test]
async fn fatal_completion_before_any_step_is_an_error() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err(CompletionError::Fatal(
        "bad api key".to_string(),
    ))]));
    let engine = engine_with(seeded_store(), provider, Config::default());

    let result = engine
        .run("Investigate Smith", &CancellationToken::new())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn transient_completion_failures_are_retried() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(CompletionError::Transient("connection reset".to_string())),
        text_reply("Recovered."),
    ]));
    let engine = engine_with(seeded_store(), provider.clone(), Config::default());

    let report = engine
        .run("Investigate Smith", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.answer, "Recovered.");
    assert_eq!(provider.calls_made(), 2);
}

#[tokio::test]
async fn sibling_tool_calls_all_resolve_in_one_step() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_reply(vec![
            (
                "tu_1",
                "resolve_person",
                serde_json::json!({"name": "Smith"}),
            ),
            ("tu_2", "get_sessions", serde_json::json!({})),
        ]),
        text_reply("Done."),
    ]));
    let engine = engine_with(seeded_store(), provider, Config::default());

    let report = engine
        .run("Investigate Smith", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.steps[0].invocations.len(), 2);
    assert!(report.steps[0]
        .invocations
        .iter()
        .all(|i| matches!(i.outcome, InvocationOutcome::Result(_))));
}
