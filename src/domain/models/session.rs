//! Legislative sessions and the derived analysis window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Legislative session identifier.
pub type SessionId = i64;

/// A legislative session. Its effective date range is *derived* from vote
/// activity, not from the stored metadata; the stored dates only serve as a
/// fallback when no votes have been recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegislativeSession {
    pub id: SessionId,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// The effective analysis date range for one or more sessions.
///
/// `Indeterminate` means neither votes nor stored metadata existed; callers
/// must treat it as "no temporal filter", never as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionWindow {
    Resolved {
        from_date: NaiveDate,
        to_date: NaiveDate,
    },
    Indeterminate,
}

impl SessionWindow {
    /// Whether a date falls inside the window. An indeterminate window
    /// applies no temporal filter, so every date is inside it.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            SessionWindow::Resolved { from_date, to_date } => {
                *from_date <= date && date <= *to_date
            }
            SessionWindow::Indeterminate => true,
        }
    }

    pub fn from_date(&self) -> Option<NaiveDate> {
        match self {
            SessionWindow::Resolved { from_date, .. } => Some(*from_date),
            SessionWindow::Indeterminate => None,
        }
    }

    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            SessionWindow::Resolved { to_date, .. } => Some(*to_date),
            SessionWindow::Indeterminate => None,
        }
    }
}
