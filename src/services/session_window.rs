//! Session window resolution from observed vote activity.

use chrono::Duration;
use std::sync::Arc;
use tracing::debug;

use crate::domain::errors::EngineResult;
use crate::domain::models::{SessionId, SessionWindow};
use crate::domain::ports::InvestigationStore;

/// Derives an analysis date range for one or more legislative sessions from
/// recorded vote dates, padded by lead/lag days. Falls back to stored
/// session metadata when no votes exist, and resolves `Indeterminate` (not
/// an error) when neither exists.
pub struct SessionWindowResolver {
    store: Arc<dyn InvestigationStore>,
}

impl SessionWindowResolver {
    pub fn new(store: Arc<dyn InvestigationStore>) -> Self {
        Self { store }
    }

    /// Resolve the window for the union of the given sessions.
    pub async fn resolve(
        &self,
        session_ids: &[SessionId],
        lead_days: i64,
        lag_days: i64,
    ) -> EngineResult<SessionWindow> {
        let bounds = match self.store.vote_date_bounds(session_ids).await? {
            Some(bounds) => Some(bounds),
            None => self.stored_date_bounds(session_ids).await?,
        };

        let Some((min_date, max_date)) = bounds else {
            debug!(?session_ids, "no votes or stored dates; window indeterminate");
            return Ok(SessionWindow::Indeterminate);
        };

        let window = SessionWindow::Resolved {
            from_date: min_date - Duration::days(lead_days),
            to_date: max_date + Duration::days(lag_days),
        };
        debug!(?session_ids, ?window, "resolved session window");
        Ok(window)
    }

    /// Fallback bounds from stored session start/end metadata: the earliest
    /// and latest of whatever dates exist across the sessions.
    async fn stored_date_bounds(
        &self,
        session_ids: &[SessionId],
    ) -> EngineResult<Option<(chrono::NaiveDate, chrono::NaiveDate)>> {
        let sessions = self.store.get_sessions(session_ids).await?;
        let dates: Vec<chrono::NaiveDate> = sessions
            .iter()
            .flat_map(|s| [s.start_date, s.end_date])
            .flatten()
            .collect();
        let min = dates.iter().min().copied();
        let max = dates.iter().max().copied();
        Ok(min.zip(max))
    }
}
