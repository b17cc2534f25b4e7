//! Shared fixtures: an in-memory store and a scripted completion provider.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::Mutex;

use donorprobe::domain::errors::{EngineError, EngineResult};
use donorprobe::domain::models::{
    Bill, BillId, Disposition, DonationTransaction, DonorEntity, EntityId, LegislativeSession,
    LegislatorId, Person, PersonId, SessionId, Vote, VoteValue,
};
use donorprobe::domain::ports::{
    ChatMessage, CompletionError, CompletionProvider, CompletionResponse, InvestigationStore,
    ToolSchema,
};

pub fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub fn person(id: PersonId, name: &str, party: &str) -> Person {
    Person {
        id,
        display_name: name.to_string(),
        party: Some(party.to_string()),
        legislator_ids: vec![id * 10],
        entity_ids: vec![id * 100],
    }
}

pub fn session(id: SessionId, name: &str, start: Option<&str>, end: Option<&str>) -> LegislativeSession {
    LegislativeSession {
        id,
        name: name.to_string(),
        start_date: start.map(d),
        end_date: end.map(d),
    }
}

pub fn bill(id: BillId, session_id: SessionId, number: &str, title: &str) -> Bill {
    Bill {
        id,
        session_id,
        number: number.to_string(),
        title: title.to_string(),
        description: String::new(),
        introduced_on: None,
        sponsors: Vec::new(),
        summary_embedding: None,
        fulltext_embedding: None,
    }
}

pub fn vote(
    legislator_id: LegislatorId,
    bill_id: BillId,
    value: VoteValue,
    party: &str,
    date: &str,
) -> Vote {
    Vote {
        legislator_id,
        bill_id,
        value,
        party: Some(party.to_string()),
        vote_date: d(date),
    }
}

pub fn contribution(
    id: i64,
    donor: EntityId,
    recipient: EntityId,
    amount: f64,
    date: &str,
) -> DonationTransaction {
    DonationTransaction {
        id,
        donor_entity_id: donor,
        recipient_entity_id: recipient,
        amount,
        transaction_date: d(date),
        disposition: Disposition::Contribution,
        employer: None,
        occupation: None,
        embedding: None,
    }
}

/// In-memory `InvestigationStore` seeded per test.
#[derive(Default)]
pub struct MemoryStore {
    pub persons: Vec<Person>,
    pub sessions: Vec<LegislativeSession>,
    pub bills: Vec<Bill>,
    pub votes: Vec<Vote>,
    pub transactions: Vec<DonationTransaction>,
    pub entities: Vec<DonorEntity>,
    pub unhealthy: bool,
}

impl MemoryStore {
    fn session_ids_or_all(&self, ids: &[SessionId]) -> Vec<SessionId> {
        if ids.is_empty() {
            self.sessions.iter().map(|s| s.id).collect()
        } else {
            ids.to_vec()
        }
    }

    fn bill_session(&self, bill_id: BillId) -> Option<SessionId> {
        self.bills.iter().find(|b| b.id == bill_id).map(|b| b.session_id)
    }
}

#[async_trait]
impl InvestigationStore for MemoryStore {
    async fn health_check(&self) -> EngineResult<()> {
        if self.unhealthy {
            return Err(EngineError::Fatal("store unreachable".to_string()));
        }
        Ok(())
    }

    async fn find_persons_by_name(&self, name: &str) -> EngineResult<Vec<Person>> {
        let needle = name.to_lowercase();
        Ok(self
            .persons
            .iter()
            .filter(|p| p.display_name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn get_person(&self, id: PersonId) -> EngineResult<Option<Person>> {
        Ok(self.persons.iter().find(|p| p.id == id).cloned())
    }

    async fn list_sessions(&self) -> EngineResult<Vec<LegislativeSession>> {
        Ok(self.sessions.clone())
    }

    async fn get_sessions(&self, ids: &[SessionId]) -> EngineResult<Vec<LegislativeSession>> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn vote_date_bounds(
        &self,
        session_ids: &[SessionId],
    ) -> EngineResult<Option<(NaiveDate, NaiveDate)>> {
        let dates: Vec<NaiveDate> = self
            .votes
            .iter()
            .filter(|v| {
                self.bill_session(v.bill_id)
                    .is_some_and(|sid| session_ids.contains(&sid))
            })
            .map(|v| v.vote_date)
            .collect();
        Ok(dates
            .iter()
            .min()
            .copied()
            .zip(dates.iter().max().copied()))
    }

    async fn bills_voted_by(
        &self,
        legislator_ids: &[LegislatorId],
        session_id: SessionId,
    ) -> EngineResult<Vec<Bill>> {
        Ok(self
            .bills
            .iter()
            .filter(|b| b.session_id == session_id)
            .filter(|b| {
                self.votes
                    .iter()
                    .any(|v| v.bill_id == b.id && legislator_ids.contains(&v.legislator_id))
            })
            .cloned()
            .collect())
    }

    async fn votes_on_bill(&self, bill_id: BillId) -> EngineResult<Vec<Vote>> {
        Ok(self
            .votes
            .iter()
            .filter(|v| v.bill_id == bill_id)
            .cloned()
            .collect())
    }

    async fn votes_by_legislator(
        &self,
        legislator_id: LegislatorId,
        session_ids: &[SessionId],
    ) -> EngineResult<Vec<Vote>> {
        let session_ids = self.session_ids_or_all(session_ids);
        Ok(self
            .votes
            .iter()
            .filter(|v| v.legislator_id == legislator_id)
            .filter(|v| {
                self.bill_session(v.bill_id)
                    .is_some_and(|sid| session_ids.contains(&sid))
            })
            .cloned()
            .collect())
    }

    async fn sponsorships(
        &self,
        legislator_id: LegislatorId,
        session_ids: &[SessionId],
    ) -> EngineResult<Vec<Bill>> {
        let session_ids = self.session_ids_or_all(session_ids);
        Ok(self
            .bills
            .iter()
            .filter(|b| session_ids.contains(&b.session_id))
            .filter(|b| b.sponsors.iter().any(|s| s.legislator_id == legislator_id))
            .cloned()
            .collect())
    }

    async fn get_bill_by_number(&self, number: &str) -> EngineResult<Option<Bill>> {
        Ok(self
            .bills
            .iter()
            .find(|b| b.number.eq_ignore_ascii_case(number))
            .cloned())
    }

    async fn transactions_for_recipients(
        &self,
        entity_ids: &[EntityId],
    ) -> EngineResult<Vec<DonationTransaction>> {
        Ok(self
            .transactions
            .iter()
            .filter(|t| entity_ids.contains(&t.recipient_entity_id))
            .cloned()
            .collect())
    }

    async fn donor_entities(&self, ids: &[EntityId]) -> EngineResult<Vec<DonorEntity>> {
        Ok(self
            .entities
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect())
    }
}

/// Completion provider that replays a fixed script of replies, recording how
/// many tools each request offered.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<CompletionResponse, CompletionError>>>,
    pub tool_counts: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<CompletionResponse, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            tool_counts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls_made(&self) -> usize {
        self.tool_counts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(
        &self,
        _system: &str,
        _history: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<CompletionResponse, CompletionError> {
        self.tool_counts.lock().unwrap().push(tools.len());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Fatal("script exhausted".to_string())))
    }
}

/// Reply helpers for scripting the provider.
pub fn text_reply(text: &str) -> Result<CompletionResponse, CompletionError> {
    Ok(CompletionResponse {
        text: Some(text.to_string()),
        tool_calls: Vec::new(),
    })
}

pub fn tool_reply(
    calls: Vec<(&str, &str, serde_json::Value)>,
) -> Result<CompletionResponse, CompletionError> {
    Ok(CompletionResponse {
        text: None,
        tool_calls: calls
            .into_iter()
            .map(|(id, name, arguments)| donorprobe::domain::ports::ToolCallRequest {
                id: id.to_string(),
                name: name.to_string(),
                arguments,
            })
            .collect(),
    })
}
