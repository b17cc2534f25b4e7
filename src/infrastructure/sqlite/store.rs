//! SQLite implementation of the `InvestigationStore` port.
//!
//! All queries are parameterized reads against the ingestion database.
//! Unrecognized vote spellings degrade to `Other` rather than failing the
//! whole roll-call; a single dirty row must not sink an investigation.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use tracing::warn;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{
    Bill, BillId, DonationTransaction, DonorEntity, EntityId, LegislativeSession, LegislatorId,
    Person, PersonId, SessionId, Sponsor, Vote, VoteValue,
};
use crate::domain::ports::InvestigationStore;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_person(&self, row: PersonRow) -> EngineResult<Person> {
        let legislator_ids: Vec<(i64,)> =
            sqlx::query_as("SELECT legislator_id FROM person_legislators WHERE person_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;
        let entity_ids: Vec<(i64,)> =
            sqlx::query_as("SELECT entity_id FROM person_entities WHERE person_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Person {
            id: row.id,
            display_name: row.display_name,
            party: row.party,
            legislator_ids: legislator_ids.into_iter().map(|(id,)| id).collect(),
            entity_ids: entity_ids.into_iter().map(|(id,)| id).collect(),
        })
    }

    async fn attach_sponsors(&self, rows: Vec<BillRow>) -> EngineResult<Vec<Bill>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let bill_ids: Vec<BillId> = rows.iter().map(|r| r.id).collect();
        let sql = format!(
            "SELECT bill_id, legislator_id, name FROM bill_sponsors WHERE bill_id IN ({})",
            placeholders(bill_ids.len())
        );
        let mut query = sqlx::query_as::<_, SponsorRow>(&sql);
        for id in &bill_ids {
            query = query.bind(id);
        }
        let sponsor_rows = query.fetch_all(&self.pool).await?;

        let mut by_bill: HashMap<BillId, Vec<Sponsor>> = HashMap::new();
        for s in sponsor_rows {
            by_bill.entry(s.bill_id).or_default().push(Sponsor {
                legislator_id: s.legislator_id,
                name: s.name,
            });
        }

        rows.into_iter()
            .map(|row| {
                let sponsors = by_bill.remove(&row.id).unwrap_or_default();
                row.into_bill(sponsors)
            })
            .collect()
    }
}

#[async_trait]
impl InvestigationStore for SqliteStore {
    async fn health_check(&self) -> EngineResult<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| EngineError::Fatal(format!("store unreachable: {e}")))?;
        Ok(())
    }

    async fn find_persons_by_name(&self, name: &str) -> EngineResult<Vec<Person>> {
        let pattern = format!("%{}%", name.trim());
        let rows: Vec<PersonRow> = sqlx::query_as(
            "SELECT id, display_name, party FROM persons
             WHERE display_name LIKE ? COLLATE NOCASE
             ORDER BY display_name LIMIT 25",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        let mut persons = Vec::with_capacity(rows.len());
        for row in rows {
            persons.push(self.load_person(row).await?);
        }
        Ok(persons)
    }

    async fn get_person(&self, id: PersonId) -> EngineResult<Option<Person>> {
        let row: Option<PersonRow> =
            sqlx::query_as("SELECT id, display_name, party FROM persons WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some(row) => Ok(Some(self.load_person(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_sessions(&self) -> EngineResult<Vec<LegislativeSession>> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT id, name, start_date, end_date FROM sessions ORDER BY start_date DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SessionRow::into_session).collect()
    }

    async fn get_sessions(&self, ids: &[SessionId]) -> EngineResult<Vec<LegislativeSession>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, name, start_date, end_date FROM sessions WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, SessionRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(SessionRow::into_session).collect()
    }

    async fn vote_date_bounds(
        &self,
        session_ids: &[SessionId],
    ) -> EngineResult<Option<(NaiveDate, NaiveDate)>> {
        if session_ids.is_empty() {
            return Ok(None);
        }
        let sql = format!(
            "SELECT MIN(v.vote_date), MAX(v.vote_date)
             FROM votes v JOIN bills b ON b.id = v.bill_id
             WHERE b.session_id IN ({})",
            placeholders(session_ids.len())
        );
        let mut query = sqlx::query_as::<_, (Option<String>, Option<String>)>(&sql);
        for id in session_ids {
            query = query.bind(id);
        }
        let (min, max) = query.fetch_one(&self.pool).await?;
        match (min, max) {
            (Some(min), Some(max)) => Ok(Some((parse_date(&min)?, parse_date(&max)?))),
            _ => Ok(None),
        }
    }

    async fn bills_voted_by(
        &self,
        legislator_ids: &[LegislatorId],
        session_id: SessionId,
    ) -> EngineResult<Vec<Bill>> {
        if legislator_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT DISTINCT b.id, b.session_id, b.number, b.title, b.description,
                    b.introduced_on, b.summary_embedding, b.fulltext_embedding
             FROM bills b JOIN votes v ON v.bill_id = b.id
             WHERE b.session_id = ? AND v.legislator_id IN ({})",
            placeholders(legislator_ids.len())
        );
        let mut query = sqlx::query_as::<_, BillRow>(&sql).bind(session_id);
        for id in legislator_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        self.attach_sponsors(rows).await
    }

    async fn votes_on_bill(&self, bill_id: BillId) -> EngineResult<Vec<Vote>> {
        let rows: Vec<VoteRow> = sqlx::query_as(
            "SELECT v.legislator_id, v.bill_id, v.value, l.party, v.vote_date
             FROM votes v LEFT JOIN legislators l ON l.id = v.legislator_id
             WHERE v.bill_id = ?",
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(VoteRow::into_vote).collect()
    }

    async fn votes_by_legislator(
        &self,
        legislator_id: LegislatorId,
        session_ids: &[SessionId],
    ) -> EngineResult<Vec<Vote>> {
        let mut sql = String::from(
            "SELECT v.legislator_id, v.bill_id, v.value, l.party, v.vote_date
             FROM votes v
             LEFT JOIN legislators l ON l.id = v.legislator_id
             JOIN bills b ON b.id = v.bill_id
             WHERE v.legislator_id = ?",
        );
        if !session_ids.is_empty() {
            sql.push_str(&format!(
                " AND b.session_id IN ({})",
                placeholders(session_ids.len())
            ));
        }
        sql.push_str(" ORDER BY v.vote_date");
        let mut query = sqlx::query_as::<_, VoteRow>(&sql).bind(legislator_id);
        for id in session_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(VoteRow::into_vote).collect()
    }

    async fn sponsorships(
        &self,
        legislator_id: LegislatorId,
        session_ids: &[SessionId],
    ) -> EngineResult<Vec<Bill>> {
        let mut sql = String::from(
            "SELECT DISTINCT b.id, b.session_id, b.number, b.title, b.description,
                    b.introduced_on, b.summary_embedding, b.fulltext_embedding
             FROM bills b JOIN bill_sponsors s ON s.bill_id = b.id
             WHERE s.legislator_id = ?",
        );
        if !session_ids.is_empty() {
            sql.push_str(&format!(
                " AND b.session_id IN ({})",
                placeholders(session_ids.len())
            ));
        }
        let mut query = sqlx::query_as::<_, BillRow>(&sql).bind(legislator_id);
        for id in session_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        self.attach_sponsors(rows).await
    }

    async fn get_bill_by_number(&self, number: &str) -> EngineResult<Option<Bill>> {
        let row: Option<BillRow> = sqlx::query_as(
            "SELECT id, session_id, number, title, description,
                    introduced_on, summary_embedding, fulltext_embedding
             FROM bills WHERE number = ? COLLATE NOCASE
             ORDER BY session_id DESC LIMIT 1",
        )
        .bind(number.trim())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(self.attach_sponsors(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn transactions_for_recipients(
        &self,
        entity_ids: &[EntityId],
    ) -> EngineResult<Vec<DonationTransaction>> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, donor_entity_id, recipient_entity_id, amount, transaction_date,
                    disposition, employer, occupation, embedding
             FROM transactions WHERE recipient_entity_id IN ({})
             ORDER BY transaction_date",
            placeholders(entity_ids.len())
        );
        let mut query = sqlx::query_as::<_, TransactionRow>(&sql);
        for id in entity_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(TransactionRow::into_transaction)
            .collect()
    }

    async fn donor_entities(&self, ids: &[EntityId]) -> EngineResult<Vec<DonorEntity>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, name FROM entities WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, EntityRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r| DonorEntity {
                id: r.id,
                name: r.name,
            })
            .collect())
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn parse_date(s: &str) -> EngineResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| EngineError::Fatal(format!("malformed date '{s}' in store: {e}")))
}

fn parse_opt_date(s: Option<&str>) -> EngineResult<Option<NaiveDate>> {
    s.map(parse_date).transpose()
}

/// Decode an embedding BLOB of packed little-endian f32s.
fn decode_embedding(blob: Option<Vec<u8>>) -> Option<Vec<f32>> {
    let blob = blob?;
    if blob.is_empty() || blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

#[derive(FromRow)]
struct PersonRow {
    id: i64,
    display_name: String,
    party: Option<String>,
}

#[derive(FromRow)]
struct SessionRow {
    id: i64,
    name: String,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl SessionRow {
    fn into_session(self) -> EngineResult<LegislativeSession> {
        Ok(LegislativeSession {
            id: self.id,
            name: self.name,
            start_date: parse_opt_date(self.start_date.as_deref())?,
            end_date: parse_opt_date(self.end_date.as_deref())?,
        })
    }
}

#[derive(FromRow)]
struct BillRow {
    id: i64,
    session_id: i64,
    number: String,
    title: String,
    description: Option<String>,
    introduced_on: Option<String>,
    summary_embedding: Option<Vec<u8>>,
    fulltext_embedding: Option<Vec<u8>>,
}

impl BillRow {
    fn into_bill(self, sponsors: Vec<Sponsor>) -> EngineResult<Bill> {
        Ok(Bill {
            id: self.id,
            session_id: self.session_id,
            number: self.number,
            title: self.title,
            description: self.description.unwrap_or_default(),
            introduced_on: parse_opt_date(self.introduced_on.as_deref())?,
            sponsors,
            summary_embedding: decode_embedding(self.summary_embedding),
            fulltext_embedding: decode_embedding(self.fulltext_embedding),
        })
    }
}

#[derive(FromRow)]
struct SponsorRow {
    bill_id: i64,
    legislator_id: i64,
    name: String,
}

#[derive(FromRow)]
struct VoteRow {
    legislator_id: i64,
    bill_id: i64,
    value: String,
    party: Option<String>,
    vote_date: String,
}

impl VoteRow {
    fn into_vote(self) -> EngineResult<Vote> {
        let value = self.value.parse().unwrap_or_else(|_| {
            warn!(value = %self.value, bill_id = self.bill_id, "unrecognized vote value");
            VoteValue::Other
        });
        Ok(Vote {
            legislator_id: self.legislator_id,
            bill_id: self.bill_id,
            value,
            party: self.party,
            vote_date: parse_date(&self.vote_date)?,
        })
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: i64,
    donor_entity_id: i64,
    recipient_entity_id: i64,
    amount: f64,
    transaction_date: String,
    disposition: String,
    employer: Option<String>,
    occupation: Option<String>,
    embedding: Option<Vec<u8>>,
}

impl TransactionRow {
    fn into_transaction(self) -> EngineResult<DonationTransaction> {
        let disposition = self
            .disposition
            .parse()
            .map_err(|e: String| EngineError::Fatal(format!("transaction {}: {e}", self.id)))?;
        Ok(DonationTransaction {
            id: self.id,
            donor_entity_id: self.donor_entity_id,
            recipient_entity_id: self.recipient_entity_id,
            amount: self.amount,
            transaction_date: parse_date(&self.transaction_date)?,
            disposition,
            employer: self.employer,
            occupation: self.occupation,
            embedding: decode_embedding(self.embedding),
        })
    }
}

#[derive(FromRow)]
struct EntityRow {
    id: i64,
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_packed_f32_blobs() {
        let mut blob = Vec::new();
        for v in [1.0f32, -0.5, 0.25] {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        let decoded = decode_embedding(Some(blob)).unwrap();
        assert_eq!(decoded, vec![1.0, -0.5, 0.25]);
    }

    #[test]
    fn rejects_misaligned_blobs() {
        assert!(decode_embedding(Some(vec![0u8; 5])).is_none());
        assert!(decode_embedding(Some(Vec::new())).is_none());
        assert!(decode_embedding(None).is_none());
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_date("2021-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 1).unwrap()
        );
        assert!(parse_date("03/01/2021").is_err());
    }

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
