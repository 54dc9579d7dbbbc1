//! Property tests for fold equivalence and channel policies.

use proptest::prelude::*;
use surge::{channel, BackpressurePolicy, Driver, PushResult, Store};

proptest! {
    /// Batched dispatch folds to the same state as one-at-a-time dispatch.
    #[test]
    fn prop_batch_fold_matches_sequential(actions in proptest::collection::vec(-1000i64..1000, 0..50)) {
        let batched = Store::new(0i64, |s, a: &i64| s + a);
        let sequential = Store::new(0i64, |s, a: &i64| s + a);

        batched.dispatch_all(actions.clone());
        for action in &actions {
            sequential.dispatch(*action);
        }

        prop_assert_eq!(*batched.read().state(), *sequential.read().state());
        prop_assert_eq!(*batched.read().state(), actions.iter().sum::<i64>());
    }

    /// A batch yields at most one notification; empty batches yield none.
    #[test]
    fn prop_batch_notification_count(actions in proptest::collection::vec(0i64..10, 0..20)) {
        let store = Store::new(0i64, |s, a: &i64| s + a);
        let driver = Driver::unbounded();
        store.install(&driver);

        store.dispatch_all(actions.clone());
        driver.finish();

        let observed: Vec<i64> = driver.iter().map(|s| *s.state()).collect();
        let expected_len = if actions.is_empty() { 1 } else { 2 }; // install snapshot, then one batch
        prop_assert_eq!(observed.len(), expected_len);
    }

    /// Unbounded channels deliver everything in order.
    #[test]
    fn prop_unbounded_keeps_all(values in proptest::collection::vec(any::<u32>(), 0..200)) {
        let (tx, rx) = channel(BackpressurePolicy::Unbounded);
        for v in &values {
            prop_assert_eq!(tx.push(*v), PushResult::Delivered);
        }
        tx.finish();
        let received: Vec<u32> = rx.iter().collect();
        prop_assert_eq!(received, values);
    }

    /// DropOldest keeps exactly the last `capacity` values.
    #[test]
    fn prop_drop_oldest_keeps_tail(
        values in proptest::collection::vec(any::<u32>(), 0..100),
        capacity in 1usize..16,
    ) {
        let (tx, rx) = channel(BackpressurePolicy::DropOldest(capacity));
        for v in &values {
            // The incoming value is always admitted.
            prop_assert_eq!(tx.push(*v), PushResult::Delivered);
        }
        tx.finish();
        let received: Vec<u32> = rx.iter().collect();
        let tail: Vec<u32> = values.iter().rev().take(capacity).rev().copied().collect();
        prop_assert_eq!(received, tail);
    }

    /// DropNewest keeps exactly the first `capacity` values.
    #[test]
    fn prop_drop_newest_keeps_head(
        values in proptest::collection::vec(any::<u32>(), 0..100),
        capacity in 1usize..16,
    ) {
        let (tx, rx) = channel(BackpressurePolicy::DropNewest(capacity));
        for (i, v) in values.iter().enumerate() {
            let expected = if i < capacity { PushResult::Delivered } else { PushResult::Dropped };
            prop_assert_eq!(tx.push(*v), expected);
        }
        tx.finish();
        let received: Vec<u32> = rx.iter().collect();
        let head: Vec<u32> = values.iter().take(capacity).copied().collect();
        prop_assert_eq!(received, head);
    }
}
