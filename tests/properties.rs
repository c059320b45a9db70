use std::time::{Duration, Instant};

use folio_palette::model::types::{Category, RawResults, SessionIdentity};
use folio_palette::search::categorize::categorize;
use folio_palette::search::debounce::Debouncer;
use folio_palette::search::dispatch::{LookupResponse, QueryDispatcher, gate};
use folio_palette::ui::nav::Selection;
use folio_palette::ui::popover::{PopoverConfig, TriggerRect, compute_position};
use proptest::prelude::*;

mod util;
use util::item;

fn raw_results() -> impl Strategy<Value = RawResults> {
    (0usize..5, 0usize..5, 0usize..5, 0usize..5).prop_map(|(p, a, d, n)| {
        let bucket = |count: usize, category: Category| {
            (0..count)
                .map(|i| item(&format!("{category}-{i}"), &format!("{category} {i}"), category))
                .collect::<Vec<_>>()
        };
        RawResults {
            portfolios: bucket(p, Category::Portfolio),
            assets: bucket(a, Category::Asset),
            documents: bucket(d, Category::Document),
            articles: bucket(n, Category::Article),
        }
    })
}

proptest! {
    #[test]
    fn groups_follow_priority_and_index_is_contiguous(raw in raw_results()) {
        let out = categorize(&raw);
        prop_assert_eq!(out.len(), raw.total());

        let order: Vec<usize> = out
            .groups
            .iter()
            .map(|g| Category::PRIORITY.iter().position(|c| *c == g.category).unwrap())
            .collect();
        prop_assert!(order.windows(2).all(|w| w[0] < w[1]));

        let mut next = 0;
        for group in &out.groups {
            prop_assert!(!group.items.is_empty());
            prop_assert_eq!(group.start, next);
            prop_assert_eq!(&group.items[..], raw.bucket(group.category));
            next += group.items.len();
        }
        for (i, entry) in out.flat.iter().enumerate() {
            prop_assert_eq!(entry.global_index, i);
        }
    }

    #[test]
    fn selection_stays_in_bounds(len in 0usize..8, moves in proptest::collection::vec(any::<bool>(), 0..32)) {
        let mut s = Selection::new(len);
        for down in moves {
            if down { s.next() } else { s.prev() }
            match s.current() {
                Some(i) => prop_assert!(i < len),
                None => prop_assert_eq!(len, 0),
            }
        }
    }

    #[test]
    fn n_downs_land_on_n_mod_len(len in 1usize..10, n in 0usize..40) {
        let mut s = Selection::new(len);
        for _ in 0..n {
            s.next();
        }
        prop_assert_eq!(s.current(), Some(n % len));
    }

    #[test]
    fn burst_promotes_only_the_last_value(gaps in proptest::collection::vec(0u64..179, 1..10)) {
        let delay = Duration::from_millis(180);
        let t0 = Instant::now();
        let mut d = Debouncer::new(String::new(), delay);
        let mut at = t0;
        let mut last = None;
        for (i, gap) in gaps.iter().enumerate() {
            at += Duration::from_millis(*gap);
            let value = format!("q{i}");
            d.set(value.clone(), at);
            last = Some(value);
            prop_assert!(d.poll(at + Duration::from_millis(1)).is_none());
        }
        prop_assert_eq!(d.poll(at + delay).cloned(), last);
        prop_assert!(!d.is_pending());
    }

    #[test]
    fn gate_requires_identity_and_min_length(term in "[ a-z]{0,6}", min in 0usize..5, signed_in in any::<bool>()) {
        let identity = if signed_in { SessionIdentity::new("user_1") } else { None };
        let open = gate(&term, identity.as_ref(), min).is_some();
        prop_assert_eq!(open, signed_in && term.trim().chars().count() >= min);
    }

    #[test]
    fn only_latest_response_is_applied(order in Just(vec![0usize, 1, 2]).prop_shuffle()) {
        let mut d = QueryDispatcher::new(2, SessionIdentity::new("user_1"));
        let seqs: Vec<u64> = ["ap", "app", "appl"]
            .iter()
            .map(|t| d.update_term(t).unwrap().seq)
            .collect();
        for i in order {
            let mut raw = RawResults::default();
            raw.assets.push(item(&format!("a{i}"), "x", Category::Asset));
            let applied = d.accept(LookupResponse { seq: seqs[i], outcome: Ok(raw) });
            prop_assert_eq!(applied, i == 2);
        }
        prop_assert_eq!(&d.results().unwrap().assets[0].id, "a2");
    }

    #[test]
    fn popover_sits_below_and_is_never_narrow(
        x in -20i32..200, y in -20i32..60, width in 0u16..120, height in 1u16..3,
        offset in 0u16..4, min_width in 0u16..80,
    ) {
        let trigger = TriggerRect { x, y, width, height };
        let g = compute_position(trigger, PopoverConfig { offset, min_width });
        prop_assert_eq!(g.top, y + i32::from(height) + i32::from(offset));
        prop_assert_eq!(g.left, x);
        prop_assert!(g.width >= min_width && g.width >= width);
    }
}
