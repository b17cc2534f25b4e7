//! Read-only port over the backing relational store.
//!
//! The store is an external collaborator populated by the scraping/ingestion
//! pipeline; the engine issues parameterized read queries only and never
//! mutates ingestion data.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::errors::EngineResult;
use crate::domain::models::{
    Bill, BillId, DonationTransaction, DonorEntity, EntityId, LegislativeSession, LegislatorId,
    Person, PersonId, SessionId, Vote,
};

/// Port trait for the backing store.
///
/// Implementations must be `Send + Sync` for concurrent use by sibling tool
/// calls within one loop step. Absence is expressed as `None` or an empty
/// `Vec`, never as an error.
#[async_trait]
pub trait InvestigationStore: Send + Sync {
    /// Verify the store is reachable. Failure here is the engine's only
    /// fatal condition.
    async fn health_check(&self) -> EngineResult<()>;

    /// Free-text person search against canonical identities. Never cached:
    /// results must reflect the freshest identity resolution.
    async fn find_persons_by_name(&self, name: &str) -> EngineResult<Vec<Person>>;

    async fn get_person(&self, id: PersonId) -> EngineResult<Option<Person>>;

    async fn list_sessions(&self) -> EngineResult<Vec<LegislativeSession>>;

    async fn get_sessions(&self, ids: &[SessionId]) -> EngineResult<Vec<LegislativeSession>>;

    /// Earliest and latest recorded vote dates among all bills belonging to
    /// the given sessions, or `None` when no votes exist.
    async fn vote_date_bounds(
        &self,
        session_ids: &[SessionId],
    ) -> EngineResult<Option<(NaiveDate, NaiveDate)>>;

    /// Bills in a session that any of the given legislators voted on,
    /// with sponsors and embeddings attached.
    async fn bills_voted_by(
        &self,
        legislator_ids: &[LegislatorId],
        session_id: SessionId,
    ) -> EngineResult<Vec<Bill>>;

    /// All cast votes on a bill across its roll-calls, with each caster's
    /// party joined in.
    async fn votes_on_bill(&self, bill_id: BillId) -> EngineResult<Vec<Vote>>;

    async fn votes_by_legislator(
        &self,
        legislator_id: LegislatorId,
        session_ids: &[SessionId],
    ) -> EngineResult<Vec<Vote>>;

    /// Bills sponsored by a legislator within the given sessions.
    async fn sponsorships(
        &self,
        legislator_id: LegislatorId,
        session_ids: &[SessionId],
    ) -> EngineResult<Vec<Bill>>;

    async fn get_bill_by_number(&self, number: &str) -> EngineResult<Option<Bill>>;

    /// All transactions where any of the given entities is the recipient.
    /// Date, disposition, and amount filtering happen in the aggregator.
    async fn transactions_for_recipients(
        &self,
        entity_ids: &[EntityId],
    ) -> EngineResult<Vec<DonationTransaction>>;

    async fn donor_entities(&self, ids: &[EntityId]) -> EngineResult<Vec<DonorEntity>>;
}
