//! Roll-call votes and party-outlier verdicts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::bill::BillId;
use super::person::LegislatorId;

/// A vote value as recorded on a roll-call.
///
/// Only the terminal values `Yea` and `Nay` participate in party-majority
/// computation; the rest are recorded but excluded from tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteValue {
    Yea,
    Nay,
    Excused,
    Absent,
    Other,
}

impl VoteValue {
    /// Terminal values are the only ones that can make a legislator an
    /// outlier or count toward a party majority.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VoteValue::Yea | VoteValue::Nay)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteValue::Yea => "yea",
            VoteValue::Nay => "nay",
            VoteValue::Excused => "excused",
            VoteValue::Absent => "absent",
            VoteValue::Other => "other",
        }
    }
}

impl FromStr for VoteValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yea" | "yes" | "aye" | "y" => Ok(VoteValue::Yea),
            "nay" | "no" | "n" => Ok(VoteValue::Nay),
            "excused" => Ok(VoteValue::Excused),
            "absent" | "nv" | "not voting" => Ok(VoteValue::Absent),
            "other" => Ok(VoteValue::Other),
            unknown => Err(format!("unknown vote value: {unknown}")),
        }
    }
}

/// A single cast vote on a bill's roll-call.
///
/// `party` is the caster's party at the time of the vote, joined in by the
/// store so tallies do not need a second lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub legislator_id: LegislatorId,
    pub bill_id: BillId,
    pub value: VoteValue,
    pub party: Option<String>,
    pub vote_date: NaiveDate,
}

/// Outcome of comparing a legislator's vote against their party majority.
///
/// The human-readable breakdown (`"R: 20Y/5N"`) is attached only when the
/// vote is an outlier; non-outliers carry no breakdown to avoid noise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlierVerdict {
    pub is_outlier: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_values() {
        assert!(VoteValue::Yea.is_terminal());
        assert!(VoteValue::Nay.is_terminal());
        assert!(!VoteValue::Excused.is_terminal());
        assert!(!VoteValue::Absent.is_terminal());
        assert!(!VoteValue::Other.is_terminal());
    }

    #[test]
    fn parse_common_spellings() {
        assert_eq!("Yes".parse::<VoteValue>().unwrap(), VoteValue::Yea);
        assert_eq!("aye".parse::<VoteValue>().unwrap(), VoteValue::Yea);
        assert_eq!("NO".parse::<VoteValue>().unwrap(), VoteValue::Nay);
        assert_eq!("excused".parse::<VoteValue>().unwrap(), VoteValue::Excused);
        assert!("maybe".parse::<VoteValue>().is_err());
    }
}
