use std::time::{Duration, UNIX_EPOCH};

use proptest::prelude::*;
use sommatori::adapters::{BucketedTimeCounter, RangeTranslator};
use sommatori::backend::{InstrumentedBackend, MemoryBackend};
use sommatori::context::Context;
use sommatori::counters::linear::LinearCounter;
use sommatori::counters::linear_time::LinearTimeCounter;
use sommatori::counters::range_tree::RangeTreeCounter;
use sommatori::counters::{RangeCounter, TimeRangeCounter};
use sommatori::granularity::Granularity;
use sommatori::tree::TreeShape;

fn shapes() -> impl Strategy<Value = TreeShape> {
    (1u32..=8, 1u32..=4).prop_map(|(h, b)| TreeShape::new(h, b).expect("valid shape"))
}

fn granularities() -> impl Strategy<Value = Granularity> {
    prop_oneof![
        Just(Granularity::Second),
        Just(Granularity::Minute),
        Just(Granularity::Hour),
    ]
}

fn increments() -> impl Strategy<Value = Vec<(i64, i64)>> {
    proptest::collection::vec((-300i64..300, -50i64..50), 0..60)
}

fn queries() -> impl Strategy<Value = Vec<(i64, i64)>> {
    proptest::collection::vec((-400i64..400, -400i64..400), 1..40)
}

proptest! {
    #[test]
    fn tree_matches_linear(shape in shapes(), ops in increments(), ranges in queries()) {
        let ctx = Context::background();
        let tree = RangeTreeCounter::new(MemoryBackend::new(), shape);
        let linear = LinearCounter::new(MemoryBackend::new());

        for &(at, by) in &ops {
            tree.increment(&ctx, at, by).unwrap();
            linear.increment(&ctx, at, by).unwrap();
        }
        for &(from, to) in &ranges {
            prop_assert_eq!(
                tree.query_sum(&ctx, from, to).unwrap(),
                linear.query_sum(&ctx, from, to).unwrap(),
                "shape {:?} range [{}, {}]", shape, from, to
            );
        }
    }

    #[test]
    fn shapes_agree_on_one_backend(
        a in shapes(),
        b in shapes(),
        ops in increments(),
        ranges in queries(),
    ) {
        let ctx = Context::background();
        let backend = MemoryBackend::new();
        let first = RangeTreeCounter::new(&backend, a).with_namespace("a");
        let second = RangeTreeCounter::new(&backend, b).with_namespace("b");

        for &(at, by) in &ops {
            first.increment(&ctx, at, by).unwrap();
            second.increment(&ctx, at, by).unwrap();
        }
        for &(from, to) in &ranges {
            prop_assert_eq!(
                first.query_sum(&ctx, from, to).unwrap(),
                second.query_sum(&ctx, from, to).unwrap()
            );
        }
    }

    #[test]
    fn decomposition_is_an_exact_disjoint_cover(
        shape in shapes(),
        from in any::<i64>(),
        width in 0i64..5000,
    ) {
        let to = from.saturating_add(width);
        let mut spans: Vec<(i64, i64)> = shape
            .decompose(from, to)
            .into_iter()
            .map(|n| (n.first as i64, shape.node_last(n) as i64))
            .collect();
        spans.sort();

        prop_assert!(!spans.is_empty());
        prop_assert_eq!(spans[0].0, from);
        prop_assert_eq!(spans[spans.len() - 1].1, to);
        for pair in spans.windows(2) {
            prop_assert_eq!(pair[0].1 + 1, pair[1].0);
        }
    }

    #[test]
    fn query_keys_stay_bounded_below_the_root(
        shape in (1u32..=6, 1u32..=4).prop_map(|(h, b)| TreeShape::new(h, b).expect("valid shape")),
        from in 0i64..1_000_000,
        width_fraction in 0.0f64..1.0,
    ) {
        let span = 1i64 << (shape.bit_width() * (shape.height() - 1));
        let width = ((span - 1) as f64 * width_fraction) as i64;
        let fan_out = 1usize << shape.bit_width();
        let bound = 2 * (shape.height() as usize - 1) * fan_out + 2;

        let backend = InstrumentedBackend::new(MemoryBackend::new());
        let counter = RangeTreeCounter::new(&backend, shape);
        counter.query_sum(&Context::background(), from, from + width).unwrap();

        let stats = backend.stats();
        prop_assert_eq!(stats.query_calls, 1);
        prop_assert!(
            stats.query_keys as usize <= bound,
            "{} keys for width {} in {:?}", stats.query_keys, width, shape
        );
        prop_assert_eq!(counter.query_keys(from, from + width).len() as u64, stats.query_keys);
    }

    #[test]
    fn increment_touches_height_keys(shape in shapes(), at in any::<i64>()) {
        let backend = InstrumentedBackend::new(MemoryBackend::new());
        let counter = RangeTreeCounter::new(&backend, shape);
        counter.increment(&Context::background(), at, 1).unwrap();
        prop_assert_eq!(backend.stats().increment_keys, u64::from(shape.height()));
        prop_assert_eq!(backend.inner().len(), shape.height() as usize);
    }

    #[test]
    fn translator_sums_the_scaled_span(
        factor in 1i64..=100,
        ops in increments(),
        ranges in proptest::collection::vec((-5i64..5, -5i64..5), 1..20),
    ) {
        let ctx = Context::background();
        let backend = MemoryBackend::new();
        let inner = LinearCounter::new(&backend);
        let translated = RangeTranslator::with_factor(&inner, factor).unwrap();

        for &(at, by) in &ops {
            inner.increment(&ctx, at, by).unwrap();
        }
        for &(from, to) in &ranges {
            let expected = if from > to {
                0
            } else {
                inner.query_sum(&ctx, from * factor, to * factor + factor - 1).unwrap()
            };
            prop_assert_eq!(translated.query_sum(&ctx, from, to).unwrap(), expected);
        }
    }

    #[test]
    fn bucketed_tree_matches_linear_time(
        granularity in granularities(),
        shape in shapes(),
        offsets in proptest::collection::vec((0u64..200_000, 1i64..10), 0..40),
        windows in proptest::collection::vec((0u64..200_000, 0u32..500), 1..20),
    ) {
        let ctx = Context::background();
        let base = UNIX_EPOCH + Duration::from_secs(1_546_304_461);
        let linear = LinearTimeCounter::new(MemoryBackend::new(), granularity);
        let bucketed = BucketedTimeCounter::new(
            RangeTreeCounter::new(MemoryBackend::new(), shape),
            granularity,
        );

        for &(offset, by) in &offsets {
            let at = base + Duration::from_secs(offset);
            linear.increment(&ctx, at, by).unwrap();
            bucketed.increment(&ctx, at, by).unwrap();
        }
        for &(offset, count) in &windows {
            let at = base + Duration::from_secs(offset);
            prop_assert_eq!(
                bucketed.query_sum(&ctx, at, count).unwrap(),
                linear.query_sum(&ctx, at, count).unwrap()
            );
        }
    }
}
