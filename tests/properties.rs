//! Property tests for the deterministic analysis primitives.

mod common;

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;

use common::{contribution, d};
use donorprobe::domain::models::{Budget, SessionWindow};
use donorprobe::services::{aggregate_donors, cache_key, mode_of, AggregateOptions, SimilarityIndex};

fn arb_vector(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-10.0f32..10.0, len)
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2015i32..2025, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, day)| NaiveDate::from_ymd_opt(y, m, day).unwrap())
}

proptest! {
    #[test]
    fn cosine_is_bounded_and_symmetric(a in arb_vector(8), b in arb_vector(8)) {
        let index = SimilarityIndex;
        let ab = index.cosine(&a, &b);
        let ba = index.cosine(&b, &a);
        prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&ab));
        prop_assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn cosine_of_self_is_one_or_zero(a in arb_vector(8)) {
        let index = SimilarityIndex;
        let sim = index.cosine(&a, &a);
        let zero_norm = a.iter().all(|x| *x == 0.0);
        if zero_norm {
            prop_assert_eq!(sim, 0.0);
        } else {
            prop_assert!((sim - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn resolved_windows_contain_exactly_their_range(
        start in arb_date(),
        span in 0i64..400,
        probe in arb_date(),
    ) {
        let end = start + chrono::Duration::days(span);
        let window = SessionWindow::Resolved { from_date: start, to_date: end };
        prop_assert_eq!(window.contains(probe), start <= probe && probe <= end);
    }

    #[test]
    fn aggregated_totals_sum_to_filtered_input(
        amounts in prop::collection::vec(1.0f64..10_000.0, 1..30),
        donors in prop::collection::vec(1i64..5, 1..30),
    ) {
        let n = amounts.len().min(donors.len());
        let transactions: Vec<_> = (0..n)
            .map(|i| contribution(i as i64, donors[i], 100, amounts[i], "2021-03-01"))
            .collect();

        let totals = aggregate_donors(
            &transactions,
            &HashMap::new(),
            &AggregateOptions::default(),
        );

        let input_sum: f64 = transactions.iter().map(|t| t.amount).sum();
        let output_sum: f64 = totals.iter().map(|t| t.total).sum();
        prop_assert!((input_sum - output_sum).abs() < 1e-6);

        let count: usize = totals.iter().map(|t| t.donation_count).sum();
        prop_assert_eq!(count, n);
    }

    #[test]
    fn aggregation_ordering_is_deterministic(
        amounts in prop::collection::vec(1.0f64..10_000.0, 1..20),
    ) {
        let transactions: Vec<_> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| contribution(i as i64, (i % 4) as i64, 100, *amount, "2021-03-01"))
            .collect();
        let a = aggregate_donors(&transactions, &HashMap::new(), &AggregateOptions::default());
        let b = aggregate_donors(&transactions, &HashMap::new(), &AggregateOptions::default());
        let ids_a: Vec<_> = a.iter().map(|t| t.entity_id).collect();
        let ids_b: Vec<_> = b.iter().map(|t| t.entity_id).collect();
        prop_assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn mode_returns_an_input_value(values in prop::collection::vec("[a-z]{1,6}", 0..20)) {
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        match mode_of(refs.iter().copied()) {
            Some(mode) => prop_assert!(values.iter().any(|v| v == &mode)),
            None => prop_assert!(values.iter().all(|v| v.trim().is_empty())),
        }
    }

    #[test]
    fn cache_keys_ignore_object_key_order(x in 0i64..100, y in 0i64..100) {
        let a = serde_json::json!({"x": x, "y": y});
        let b = serde_json::json!({"y": y, "x": x});
        prop_assert_eq!(cache_key("tool", &a), cache_key("tool", &b));
    }

    #[test]
    fn budget_never_increases(steps in 1u32..30, roundtrips in 1u32..30, spends in 0usize..60) {
        let mut budget = Budget::new(steps, roundtrips);
        for i in 0..spends {
            let next = if i % 2 == 0 { budget.spend_step() } else { budget.spend_roundtrip() };
            match next {
                Some(next) => {
                    prop_assert!(next.steps_remaining <= budget.steps_remaining);
                    prop_assert!(next.roundtrips_remaining <= budget.roundtrips_remaining);
                    budget = next;
                }
                None => break,
            }
        }
    }
}

#[test]
fn window_scenario_dates_line_up() {
    // 2021-03-01 minus 90 days and 2021-05-15 plus 45 days.
    assert_eq!(d("2021-03-01") - chrono::Duration::days(90), d("2020-12-01"));
    assert_eq!(d("2021-05-15") + chrono::Duration::days(45), d("2021-06-29"));
}
