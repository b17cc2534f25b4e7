//! Registered investigation tools: typed arguments, declared schemas, and
//! cached dispatch.
//!
//! Tool arguments are a closed set of tagged variants validated before
//! dispatch; dynamically shaped JSON is never trusted at call time.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{
    Config, EntityId, LegislatorId, PersonId, SessionId, SessionWindow,
};
use crate::domain::ports::{InvestigationStore, ToolSchema};
use crate::services::bill_ranker::{BillRanker, RankRequest};
use crate::services::donor_aggregate::{aggregate_donors, AggregateOptions};
use crate::services::outlier::party_tallies;
use crate::services::query_cache::{cache_key, QueryCache};
use crate::services::session_window::SessionWindowResolver;
use crate::services::themes::ThemeSynthesizer;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolvePersonArgs {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetDonationsArgs {
    pub entity_ids: Vec<EntityId>,
    #[serde(default)]
    pub session_ids: Option<Vec<SessionId>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetVotesArgs {
    pub legislator_id: LegislatorId,
    #[serde(default)]
    pub session_ids: Option<Vec<SessionId>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetSponsorshipsArgs {
    pub legislator_id: LegislatorId,
    #[serde(default)]
    pub session_ids: Option<Vec<SessionId>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetBillDetailsArgs {
    pub bill_number: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankBillsArgs {
    pub person_id: PersonId,
    pub session_id: SessionId,
    #[serde(default)]
    pub search_terms: Option<Vec<String>>,
    #[serde(default)]
    pub query_vectors: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    pub similarity_threshold: Option<f64>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetDonorTotalsArgs {
    #[serde(default)]
    pub person_id: Option<PersonId>,
    #[serde(default)]
    pub entity_ids: Option<Vec<EntityId>>,
    #[serde(default)]
    pub session_ids: Option<Vec<SessionId>>,
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
    #[serde(default)]
    pub min_amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesizeThemesArgs {
    pub person_id: PersonId,
    #[serde(default)]
    pub session_ids: Option<Vec<SessionId>>,
}

/// The closed set of tools the loop may dispatch.
#[derive(Debug, Clone)]
pub enum ToolCall {
    ResolvePerson(ResolvePersonArgs),
    GetSessions,
    GetDonations(GetDonationsArgs),
    GetVotes(GetVotesArgs),
    GetSponsorships(GetSponsorshipsArgs),
    GetBillDetails(GetBillDetailsArgs),
    RankBills(RankBillsArgs),
    GetDonorTotals(GetDonorTotalsArgs),
    SynthesizeDonorThemes(SynthesizeThemesArgs),
}

impl ToolCall {
    /// Validate raw (name, arguments) from the model into a typed call.
    /// Unknown tools and malformed arguments are rejected before dispatch.
    pub fn parse(name: &str, arguments: &serde_json::Value) -> EngineResult<Self> {
        fn de<T: serde::de::DeserializeOwned>(
            tool: &str,
            args: &serde_json::Value,
        ) -> EngineResult<T> {
            serde_json::from_value(args.clone())
                .map_err(|e| EngineError::ToolArgumentInvalid(format!("{tool}: {e}")))
        }

        match name {
            "resolve_person" => Ok(ToolCall::ResolvePerson(de(name, arguments)?)),
            "get_sessions" => Ok(ToolCall::GetSessions),
            "get_donations" => Ok(ToolCall::GetDonations(de(name, arguments)?)),
            "get_votes" => Ok(ToolCall::GetVotes(de(name, arguments)?)),
            "get_sponsorships" => Ok(ToolCall::GetSponsorships(de(name, arguments)?)),
            "get_bill_details" => Ok(ToolCall::GetBillDetails(de(name, arguments)?)),
            "rank_bills" => Ok(ToolCall::RankBills(de(name, arguments)?)),
            "get_donor_totals" => Ok(ToolCall::GetDonorTotals(de(name, arguments)?)),
            "synthesize_donor_themes" => {
                Ok(ToolCall::SynthesizeDonorThemes(de(name, arguments)?))
            }
            unknown => Err(EngineError::ToolArgumentInvalid(format!(
                "unknown tool: {unknown}"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::ResolvePerson(_) => "resolve_person",
            ToolCall::GetSessions => "get_sessions",
            ToolCall::GetDonations(_) => "get_donations",
            ToolCall::GetVotes(_) => "get_votes",
            ToolCall::GetSponsorships(_) => "get_sponsorships",
            ToolCall::GetBillDetails(_) => "get_bill_details",
            ToolCall::RankBills(_) => "rank_bills",
            ToolCall::GetDonorTotals(_) => "get_donor_totals",
            ToolCall::SynthesizeDonorThemes(_) => "synthesize_donor_themes",
        }
    }
}

/// Declared tool schemas advertised to the model each reasoning turn.
pub fn tool_schemas() -> Vec<ToolSchema> {
    let session_ids = json!({"type": "array", "items": {"type": "integer"}});
    vec![
        ToolSchema {
            name: "resolve_person".into(),
            description: "Resolve a person by name to their canonical identity, \
                legislator records, and campaign committees."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"],
            }),
        },
        ToolSchema {
            name: "get_sessions".into(),
            description: "List known legislative sessions.".into(),
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolSchema {
            name: "get_donations".into(),
            description: "Fetch contribution transactions received by the given \
                entities, optionally restricted to sessions' derived windows."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "entity_ids": {"type": "array", "items": {"type": "integer"}},
                    "session_ids": session_ids,
                },
                "required": ["entity_ids"],
            }),
        },
        ToolSchema {
            name: "get_votes".into(),
            description: "Fetch a legislator's votes, optionally per session.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "legislator_id": {"type": "integer"},
                    "session_ids": session_ids,
                },
                "required": ["legislator_id"],
            }),
        },
        ToolSchema {
            name: "get_sponsorships".into(),
            description: "Fetch bills sponsored by a legislator, optionally per session."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "legislator_id": {"type": "integer"},
                    "session_ids": session_ids,
                },
                "required": ["legislator_id"],
            }),
        },
        ToolSchema {
            name: "get_bill_details".into(),
            description: "Fetch a bill by number with its latest roll-call tallies."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {"bill_number": {"type": "string"}},
                "required": ["bill_number"],
            }),
        },
        ToolSchema {
            name: "rank_bills".into(),
            description: "Rank bills a person's legislators voted on against search \
                terms and/or query vectors using a hybrid lexical+vector score."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "person_id": {"type": "integer"},
                    "session_id": {"type": "integer"},
                    "search_terms": {"type": "array", "items": {"type": "string"}},
                    "query_vectors": {
                        "type": "array",
                        "items": {"type": "array", "items": {"type": "number"}},
                    },
                    "similarity_threshold": {"type": "number"},
                    "limit": {"type": "integer"},
                    "offset": {"type": "integer"},
                },
                "required": ["person_id", "session_id"],
            }),
        },
        ToolSchema {
            name: "get_donor_totals".into(),
            description: "Aggregate contribution totals per donor for a person or \
                explicit entity list within a session window or explicit dates."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "person_id": {"type": "integer"},
                    "entity_ids": {"type": "array", "items": {"type": "integer"}},
                    "session_ids": session_ids,
                    "from_date": {"type": "string", "format": "date"},
                    "to_date": {"type": "string", "format": "date"},
                    "min_amount": {"type": "number"},
                },
            }),
        },
        ToolSchema {
            name: "synthesize_donor_themes".into(),
            description: "Propose evidence-backed donor themes for a person from \
                aggregated totals and ranked bills."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "person_id": {"type": "integer"},
                    "session_ids": session_ids,
                },
                "required": ["person_id"],
            }),
        },
    ]
}

/// Dispatches validated tool calls against the store and engine services,
/// memoizing expensive aggregates through the shared TTL cache.
pub struct Toolkit {
    store: Arc<dyn InvestigationStore>,
    cache: Arc<QueryCache>,
    resolver: SessionWindowResolver,
    ranker: BillRanker,
    synthesizer: ThemeSynthesizer,
    config: Config,
}

impl Toolkit {
    pub fn new(
        store: Arc<dyn InvestigationStore>,
        cache: Arc<QueryCache>,
        synthesizer: ThemeSynthesizer,
        config: Config,
    ) -> Self {
        let resolver = SessionWindowResolver::new(store.clone());
        let ranker = BillRanker::new(store.clone(), config.ranking.clone());
        Self {
            store,
            cache,
            resolver,
            ranker,
            synthesizer,
            config,
        }
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        tool_schemas()
    }

    /// Dispatch one validated call. Cache policy follows data volatility:
    /// donation aggregates get the short TTL, session/vote/bill metadata the
    /// long one, and person search and theme synthesis bypass the cache.
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        raw_arguments: &serde_json::Value,
    ) -> EngineResult<serde_json::Value> {
        let key = cache_key(call.name(), raw_arguments);
        let donation_ttl = Duration::from_secs(self.config.cache.donation_ttl_secs);
        let session_ttl = Duration::from_secs(self.config.cache.session_ttl_secs);
        debug!(tool = call.name(), "dispatching tool call");

        match call {
            ToolCall::ResolvePerson(args) => self.resolve_person(args).await,
            ToolCall::GetSessions => {
                self.cache
                    .get_or_compute(&key, session_ttl, || self.get_sessions())
                    .await
            }
            ToolCall::GetDonations(args) => {
                self.cache
                    .get_or_compute(&key, donation_ttl, || self.get_donations(args))
                    .await
            }
            ToolCall::GetVotes(args) => {
                self.cache
                    .get_or_compute(&key, session_ttl, || self.get_votes(args))
                    .await
            }
            ToolCall::GetSponsorships(args) => {
                self.cache
                    .get_or_compute(&key, session_ttl, || self.get_sponsorships(args))
                    .await
            }
            ToolCall::GetBillDetails(args) => {
                self.cache
                    .get_or_compute(&key, session_ttl, || self.get_bill_details(args))
                    .await
            }
            ToolCall::RankBills(args) => {
                self.cache
                    .get_or_compute(&key, session_ttl, || self.rank_bills(args))
                    .await
            }
            ToolCall::GetDonorTotals(args) => {
                self.cache
                    .get_or_compute(&key, donation_ttl, || self.get_donor_totals(args))
                    .await
            }
            ToolCall::SynthesizeDonorThemes(args) => self.synthesize_themes(args).await,
        }
    }

    async fn resolve_person(&self, args: &ResolvePersonArgs) -> EngineResult<serde_json::Value> {
        let persons = self.store.find_persons_by_name(&args.name).await?;
        Ok(json!({ "persons": persons }))
    }

    async fn get_sessions(&self) -> EngineResult<serde_json::Value> {
        let sessions = self.store.list_sessions().await?;
        Ok(json!({ "sessions": sessions }))
    }

    async fn get_donations(&self, args: &GetDonationsArgs) -> EngineResult<serde_json::Value> {
        let window = self.window_for(args.session_ids.as_deref()).await?;
        let entity_ids = dedup_ids(&args.entity_ids);
        let transactions = self.store.transactions_for_recipients(&entity_ids).await?;
        let filtered: Vec<_> = transactions
            .into_iter()
            .filter(|t| window.contains(t.transaction_date))
            .collect();
        Ok(json!({ "window": window, "transactions": filtered }))
    }

    async fn get_votes(&self, args: &GetVotesArgs) -> EngineResult<serde_json::Value> {
        let session_ids = args.session_ids.clone().unwrap_or_default();
        let votes = self
            .store
            .votes_by_legislator(args.legislator_id, &session_ids)
            .await?;
        Ok(json!({ "votes": votes }))
    }

    async fn get_sponsorships(
        &self,
        args: &GetSponsorshipsArgs,
    ) -> EngineResult<serde_json::Value> {
        let session_ids = args.session_ids.clone().unwrap_or_default();
        let bills = self
            .store
            .sponsorships(args.legislator_id, &session_ids)
            .await?;
        let summaries: Vec<_> = bills
            .iter()
            .map(|b| json!({"bill_id": b.id, "number": b.number, "title": b.title}))
            .collect();
        Ok(json!({ "sponsorships": summaries }))
    }

    async fn get_bill_details(
        &self,
        args: &GetBillDetailsArgs,
    ) -> EngineResult<serde_json::Value> {
        let Some(bill) = self.store.get_bill_by_number(&args.bill_number).await? else {
            return Ok(json!({ "bill": null }));
        };
        let votes = self.store.votes_on_bill(bill.id).await?;
        let tallies = party_tallies(&votes);
        let breakdown: HashMap<String, String> = tallies
            .into_iter()
            .map(|(party, (y, n))| (party.clone(), format!("{party}: {y}Y/{n}N")))
            .collect();
        Ok(json!({
            "bill": {
                "bill_id": bill.id,
                "session_id": bill.session_id,
                "number": bill.number,
                "title": bill.title,
                "description": bill.description,
                "introduced_on": bill.introduced_on,
                "sponsors": bill.sponsors,
            },
            "latest_roll_call": breakdown,
        }))
    }

    async fn rank_bills(&self, args: &RankBillsArgs) -> EngineResult<serde_json::Value> {
        let Some(person) = self.store.get_person(args.person_id).await? else {
            return Ok(json!({ "bills": [] }));
        };
        let request = RankRequest {
            search_terms: args.search_terms.clone().unwrap_or_default(),
            query_vectors: args.query_vectors.clone().unwrap_or_default(),
            similarity_threshold: args.similarity_threshold,
            limit: args.limit,
            offset: args.offset.unwrap_or(0),
        };
        let bills = self.ranker.rank(&person, args.session_id, &request).await?;
        Ok(json!({ "bills": bills }))
    }

    async fn get_donor_totals(
        &self,
        args: &GetDonorTotalsArgs,
    ) -> EngineResult<serde_json::Value> {
        // Entity set: explicit list, person's committees, or both; dedup so
        // overlapping sets cannot double count.
        let mut entity_ids: Vec<EntityId> = args.entity_ids.clone().unwrap_or_default();
        if let Some(person_id) = args.person_id {
            if let Some(person) = self.store.get_person(person_id).await? {
                entity_ids.extend(person.entity_ids);
            }
        }
        let entity_ids = dedup_ids(&entity_ids);
        if entity_ids.is_empty() {
            return Ok(json!({ "totals": [] }));
        }

        let window = match (args.from_date, args.to_date) {
            (Some(from_date), Some(to_date)) => SessionWindow::Resolved { from_date, to_date },
            _ => self.window_for(args.session_ids.as_deref()).await?,
        };

        let transactions = self.store.transactions_for_recipients(&entity_ids).await?;
        let donor_ids = dedup_ids(
            &transactions
                .iter()
                .map(|t| t.donor_entity_id)
                .collect::<Vec<_>>(),
        );
        let donor_names: HashMap<EntityId, String> = self
            .store
            .donor_entities(&donor_ids)
            .await?
            .into_iter()
            .map(|d| (d.id, d.name))
            .collect();

        let options = AggregateOptions {
            window,
            min_amount: args.min_amount.unwrap_or(0.0),
            query_vector: None,
        };
        let totals = aggregate_donors(&transactions, &donor_names, &options);
        Ok(json!({ "window": window, "totals": totals }))
    }

    async fn synthesize_themes(
        &self,
        args: &SynthesizeThemesArgs,
    ) -> EngineResult<serde_json::Value> {
        let Some(person) = self.store.get_person(args.person_id).await? else {
            return Ok(json!({ "themes": [] }));
        };

        let totals_args = GetDonorTotalsArgs {
            person_id: Some(args.person_id),
            entity_ids: None,
            session_ids: args.session_ids.clone(),
            from_date: None,
            to_date: None,
            min_amount: None,
        };
        let totals_value = self.get_donor_totals(&totals_args).await?;
        let totals: Vec<crate::domain::models::DonorTotal> =
            serde_json::from_value(totals_value["totals"].clone())
                .map_err(|e| EngineError::Fatal(e.to_string()))?;

        // Employer/occupation tags from the top donors seed the ranking
        // query so the ranker surfaces bills relevant to the donor base.
        let seed_terms: Vec<String> = totals
            .iter()
            .take(10)
            .flat_map(|t| [t.employer.clone(), t.occupation.clone()])
            .flatten()
            .collect();
        let ranked = match args.session_ids.as_deref().and_then(<[SessionId]>::first) {
            Some(&session_id) => {
                let request = RankRequest {
                    search_terms: seed_terms,
                    ..RankRequest::default()
                };
                self.ranker.rank(&person, session_id, &request).await?
            }
            None => Vec::new(),
        };

        let themes = self.synthesizer.synthesize(&totals, &ranked).await?;
        Ok(serde_json::to_value(themes).map_err(|e| EngineError::Fatal(e.to_string()))?)
    }

    /// Resolve a window for the given sessions, or no filter when absent.
    async fn window_for(
        &self,
        session_ids: Option<&[SessionId]>,
    ) -> EngineResult<SessionWindow> {
        match session_ids {
            Some(ids) if !ids.is_empty() => {
                self.resolver
                    .resolve(
                        ids,
                        self.config.window.lead_days,
                        self.config.window.lag_days,
                    )
                    .await
            }
            _ => Ok(SessionWindow::Indeterminate),
        }
    }
}

fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}
