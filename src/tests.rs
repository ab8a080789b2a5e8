#[cfg(test)]
mod lmsr_property_tests {
    use crate::lmsr_core::*;
    use crate::quote::{quote, QuoteOutcome};
    use crate::rounding::round_for_display;
    use proptest::prelude::*;
    use std::f64::consts::LN_2;

    // Property test 1: symmetric state potential
    #[test]
    fn test_symmetric_potential() {
        for b in [0.5, 1.0, 10.0, 100.0, 5000.0] {
            for q in [-250.0, 0.0, 1.0, 42.0, 1e4] {
                let c = cost_potential(b, q, q).unwrap();
                let expected = b * LN_2 + q;
                assert!(
                    (c - expected).abs() < 1e-9 * expected.abs().max(1.0),
                    "C({}, {}, {}) = {}, expected {}",
                    b, q, q, c, expected
                );
            }
            assert!((max_loss(b).unwrap() - cost_potential(b, 0.0, 0.0).unwrap()).abs() < 1e-12);
        }
    }

    // Property test 2: buying nothing is free
    #[test]
    fn test_zero_amount_is_free() {
        for (b, yes, no) in [(100.0, 0.0, 0.0), (1.0, 500.0, -3.0), (5000.0, 12.5, 9000.0)] {
            assert_eq!(trade_cost(b, yes, no, Side::Yes, 0.0).unwrap(), 0.0);
            assert_eq!(trade_cost(b, yes, no, Side::No, 0.0).unwrap(), 0.0);
        }
    }

    // Property test 3: symmetric market is a coin flip
    #[test]
    fn test_symmetric_chance_is_half() {
        assert_eq!(implied_chance(100.0, 0.0, 0.0).unwrap(), 0.5);
        assert_eq!(implied_chance(3.0, 77.0, 77.0).unwrap(), 0.5);
    }

    // Property test 4: reference example
    #[test]
    fn test_reference_quote() {
        let outcome = quote(100.0, 0.0, 0.0, Side::Yes, 10.0, None).unwrap();
        let q = match outcome {
            QuoteOutcome::Priced(q) => q,
            QuoteOutcome::Rejected { .. } => panic!("unexpected rejection"),
        };
        let expected = 100.0 * (0.1f64.exp() + 1.0).ln() - 100.0 * LN_2;
        assert!((q.cost - expected).abs() < 1e-9);
        assert_eq!(round_for_display(q.cost, 3), 5.125);
        assert!((q.tax - 0.01 * expected).abs() < 1e-9);
        assert!(q.implied_chance_after > 0.5);
    }

    // Property test 5: max loss
    #[test]
    fn test_max_loss() {
        assert_eq!(max_loss(100.0).unwrap(), 100.0 * LN_2);
        assert_eq!(round_for_display(max_loss(100.0).unwrap(), 3), 69.315);
        assert!(max_loss(101.0).unwrap() > max_loss(100.0).unwrap());
    }

    // Property test 6: no overflow for large share counts with small b
    #[test]
    fn test_large_exponent_is_stable() {
        let c = cost_potential(1.0, 10_000.0, 0.0).unwrap();
        assert!(c.is_finite());
        assert!((c - 10_000.0).abs() < 1e-9);

        let cost = trade_cost(1.0, 10_000.0, 0.0, Side::Yes, 1.0).unwrap();
        assert!((cost - 1.0).abs() < 1e-9);
        let p = implied_chance(1.0, 10_000.0, 0.0).unwrap();
        assert!(p > 0.999_999 && p <= 1.0);
    }

    // Property test 7: AMM loss bound as the market approaches certainty
    #[test]
    fn test_amm_loss_bounded() {
        let b = 5000.0;
        let bound = max_loss(b).unwrap();
        let mut q_yes = 0.0;
        let mut collected = 0.0;
        for _ in 0..200 {
            collected += trade_cost(b, q_yes, 0.0, Side::Yes, 500.0).unwrap();
            q_yes += 500.0;
        }
        // operator owes q_yes if YES resolves
        let loss = q_yes - collected;
        assert!(loss > 0.0 && loss <= bound + 1e-6, "loss={} bound={}", loss, bound);
    }

    proptest! {
        #[test]
        fn buy_then_sell_nets_to_zero(
            b in 1.0f64..10_000.0,
            yes in -1_000.0f64..10_000.0,
            no in -1_000.0f64..10_000.0,
            a in -500.0f64..500.0,
        ) {
            let buy = trade_cost(b, yes, no, Side::Yes, a).unwrap();
            let sell = trade_cost(b, yes + a, no, Side::Yes, -a).unwrap();
            prop_assert!((buy + sell).abs() < 1e-7, "net={}", buy + sell);
        }

        #[test]
        fn chance_is_monotone(
            b in 100.0f64..5_000.0,
            yes in 0.0f64..1_000.0,
            no in 0.0f64..1_000.0,
            step in 1.0f64..100.0,
        ) {
            let base = implied_chance(b, yes, no).unwrap();
            let more_yes = implied_chance(b, yes + step, no).unwrap();
            let more_no = implied_chance(b, yes, no + step).unwrap();
            prop_assert!(more_yes > base, "yes: {} !> {}", more_yes, base);
            prop_assert!(more_no < base, "no: {} !< {}", more_no, base);
        }

        #[test]
        fn complementary_chances_sum_to_one(
            b in 10.0f64..10_000.0,
            yes in 0.0f64..5_000.0,
            no in 0.0f64..5_000.0,
        ) {
            let p_yes = chance_for(b, yes, no, Side::Yes, DEFAULT_CHANCE_UNIT).unwrap();
            let p_no = chance_for(b, yes, no, Side::No, DEFAULT_CHANCE_UNIT).unwrap();
            prop_assert!((p_yes + p_no - 1.0).abs() < 1e-3);
        }

        #[test]
        fn cost_is_monotone_in_quantity(
            b in 50.0f64..1_000.0,
            yes in 0.0f64..500.0,
            no in 0.0f64..500.0,
            a in 0.1f64..100.0,
        ) {
            // dearer with more of the bought side outstanding, cheaper with more of the other
            let base = trade_cost(b, yes, no, Side::Yes, a).unwrap();
            prop_assert!(trade_cost(b, yes, no, Side::Yes, a * 2.0).unwrap() > base);
            prop_assert!(trade_cost(b, yes + 50.0, no, Side::Yes, a).unwrap() > base);
            prop_assert!(trade_cost(b, yes, no + 50.0, Side::Yes, a).unwrap() < base);
        }

        #[test]
        fn rejected_quotes_never_expose_cost_above_budget(
            b in 10.0f64..1_000.0,
            amount in 0.0f64..500.0,
            budget in 0.0f64..200.0,
        ) {
            match quote(b, 0.0, 0.0, Side::Yes, amount, Some(budget)).unwrap() {
                QuoteOutcome::Priced(q) => prop_assert!(q.cost <= budget),
                QuoteOutcome::Rejected { .. } => {
                    prop_assert!(trade_cost(b, 0.0, 0.0, Side::Yes, amount).unwrap() > budget)
                }
            }
        }
    }
}
