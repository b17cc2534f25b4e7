//! Party-outlier detection for roll-call votes.

use std::collections::HashMap;

use crate::domain::models::{LegislatorId, OutlierVerdict, Vote, VoteValue};

/// Detect whether a target legislator's vote diverged from their party's
/// majority on a bill's most recent roll-call.
///
/// Only terminal values (yea/nay) participate in tallying. A verdict is an
/// outlier only when:
/// - the target's own latest vote is terminal,
/// - a same-party majority was computable from at least one *other*
///   same-party terminal vote on that roll-call, and
/// - the target's value differs from that majority.
///
/// Majority ties are broken deterministically: yea before nay. (The
/// upstream tie policy was unspecified; this ordering is the documented
/// choice.)
pub fn detect_outlier(
    votes: &[Vote],
    target_legislator_ids: &[LegislatorId],
    target_party: &str,
) -> OutlierVerdict {
    // A bill may have multiple roll-calls; only the most recent date counts.
    let Some(roll_call_date) = votes.iter().map(|v| v.vote_date).max() else {
        return OutlierVerdict::default();
    };
    let roll_call: Vec<&Vote> = votes
        .iter()
        .filter(|v| v.vote_date == roll_call_date)
        .collect();

    let target_vote = roll_call
        .iter()
        .find(|v| target_legislator_ids.contains(&v.legislator_id));
    let Some(target_vote) = target_vote else {
        return OutlierVerdict::default();
    };
    // A non-terminal vote (excused, absent) can never be flagged.
    if !target_vote.value.is_terminal() {
        return OutlierVerdict::default();
    }

    let mut yeas = 0usize;
    let mut nays = 0usize;
    let mut other_same_party = 0usize;
    for vote in &roll_call {
        if vote.party.as_deref() != Some(target_party) || !vote.value.is_terminal() {
            continue;
        }
        match vote.value {
            VoteValue::Yea => yeas += 1,
            VoteValue::Nay => nays += 1,
            _ => {}
        }
        if !target_legislator_ids.contains(&vote.legislator_id) {
            other_same_party += 1;
        }
    }

    // Majority requires at least one other same-party vote to compare with.
    if other_same_party == 0 {
        return OutlierVerdict::default();
    }

    let majority = if yeas >= nays {
        VoteValue::Yea
    } else {
        VoteValue::Nay
    };

    if target_vote.value == majority {
        return OutlierVerdict::default();
    }

    OutlierVerdict {
        is_outlier: true,
        breakdown: Some(format!("{target_party}: {yeas}Y/{nays}N")),
    }
}

/// Tally of terminal votes per party on a single roll-call, useful for
/// rendering full-chamber breakdowns.
pub fn party_tallies(votes: &[Vote]) -> HashMap<String, (usize, usize)> {
    let Some(roll_call_date) = votes.iter().map(|v| v.vote_date).max() else {
        return HashMap::new();
    };
    let mut tallies: HashMap<String, (usize, usize)> = HashMap::new();
    for vote in votes {
        if vote.vote_date != roll_call_date || !vote.value.is_terminal() {
            continue;
        }
        let Some(party) = vote.party.clone() else {
            continue;
        };
        let entry = tallies.entry(party).or_default();
        match vote.value {
            VoteValue::Yea => entry.0 += 1,
            VoteValue::Nay => entry.1 += 1,
            _ => {}
        }
    }
    tallies
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn vote(legislator_id: i64, value: VoteValue, party: &str, date: &str) -> Vote {
        Vote {
            legislator_id,
            bill_id: 1,
            value,
            party: Some(party.to_string()),
            vote_date: d(date),
        }
    }

    /// 20 R yeas, 5 R nays, target R voted nay: outlier with breakdown.
    #[test]
    fn divergence_from_party_majority_is_outlier() {
        let mut votes: Vec<Vote> = (0..20)
            .map(|i| vote(i, VoteValue::Yea, "R", "2021-04-01"))
            .collect();
        votes.extend((20..24).map(|i| vote(i, VoteValue::Nay, "R", "2021-04-01")));
        votes.push(vote(99, VoteValue::Nay, "R", "2021-04-01"));

        let verdict = detect_outlier(&votes, &[99], "R");
        assert!(verdict.is_outlier);
        assert_eq!(verdict.breakdown.as_deref(), Some("R: 20Y/5N"));
    }

    #[test]
    fn agreement_with_majority_is_not_outlier() {
        let votes = vec![
            vote(1, VoteValue::Yea, "D", "2021-04-01"),
            vote(2, VoteValue::Yea, "D", "2021-04-01"),
            vote(99, VoteValue::Yea, "D", "2021-04-01"),
        ];
        let verdict = detect_outlier(&votes, &[99], "D");
        assert!(!verdict.is_outlier);
        assert!(verdict.breakdown.is_none());
    }

    #[test]
    fn non_terminal_target_vote_is_never_outlier() {
        let votes = vec![
            vote(1, VoteValue::Yea, "R", "2021-04-01"),
            vote(2, VoteValue::Yea, "R", "2021-04-01"),
            vote(99, VoteValue::Excused, "R", "2021-04-01"),
        ];
        let verdict = detect_outlier(&votes, &[99], "R");
        assert!(!verdict.is_outlier);
    }

    #[test]
    fn lone_party_member_has_no_computable_majority() {
        let votes = vec![
            vote(1, VoteValue::Yea, "D", "2021-04-01"),
            vote(99, VoteValue::Nay, "R", "2021-04-01"),
        ];
        let verdict = detect_outlier(&votes, &[99], "R");
        assert!(!verdict.is_outlier);
    }

    /// Only the latest roll-call date participates in tallying.
    #[test]
    fn earlier_roll_calls_are_ignored() {
        let votes = vec![
            vote(1, VoteValue::Nay, "R", "2021-02-01"),
            vote(2, VoteValue::Nay, "R", "2021-02-01"),
            vote(99, VoteValue::Nay, "R", "2021-02-01"),
            vote(1, VoteValue::Yea, "R", "2021-04-01"),
            vote(2, VoteValue::Yea, "R", "2021-04-01"),
            vote(99, VoteValue::Nay, "R", "2021-04-01"),
        ];
        let verdict = detect_outlier(&votes, &[99], "R");
        assert!(verdict.is_outlier);
        assert_eq!(verdict.breakdown.as_deref(), Some("R: 2Y/1N"));
    }

    /// Even split resolves to yea by the documented tie-break, so a yea
    /// target is not an outlier.
    #[test]
    fn even_split_breaks_toward_yea() {
        let votes = vec![
            vote(1, VoteValue::Yea, "R", "2021-04-01"),
            vote(2, VoteValue::Nay, "R", "2021-04-01"),
            vote(99, VoteValue::Yea, "R", "2021-04-01"),
        ];
        // 2Y/1N including target; excluding nothing. Majority yea.
        let verdict = detect_outlier(&votes, &[99], "R");
        assert!(!verdict.is_outlier);
    }

    #[test]
    fn party_tallies_count_latest_roll_call_only() {
        let votes = vec![
            vote(1, VoteValue::Yea, "R", "2021-04-01"),
            vote(2, VoteValue::Nay, "D", "2021-04-01"),
            vote(3, VoteValue::Yea, "D", "2021-01-01"),
        ];
        let tallies = party_tallies(&votes);
        assert_eq!(tallies.get("R"), Some(&(1, 0)));
        assert_eq!(tallies.get("D"), Some(&(0, 1)));
    }
}
