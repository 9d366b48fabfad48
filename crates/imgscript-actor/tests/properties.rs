//! Property tests for per-item ordering and exclusion
//!
//! Driven through the blocking API from plain threads so each case can run
//! without setting up an async runtime.

use imgscript_actor::{Collection, Item, ItemId, MemorySink, Task};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

type Log = Vec<(usize, usize)>;

fn append(caller: usize, seq: usize, busy: Arc<Vec<AtomicBool>>, overlap: Arc<AtomicBool>) -> Task<Log> {
    Task::new("log", "append", move |item: &mut Item<Log>| {
        let slot = &busy[item.id().index()];
        if slot.swap(true, Ordering::SeqCst) {
            overlap.store(true, Ordering::SeqCst);
        }
        item.get_or_insert_with(Vec::new).push((caller, seq));
        slot.store(false, Ordering::SeqCst);
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Tasks from one caller to one item run in the order that caller
    /// scheduled them, and no two tasks on an item ever overlap.
    #[test]
    fn prop_per_caller_fifo_without_overlap(
        items in 1usize..4,
        callers in 1usize..5,
        plan in proptest::collection::vec(0usize..4, 1..40),
    ) {
        let sink = Arc::new(MemorySink::new());
        let collection: Arc<Collection<Log>> = Arc::new(Collection::with_sink(sink.clone()));
        let ids: Vec<ItemId> = (0..items)
            .map(|n| collection.add_item(&format!("log-{n}")).unwrap())
            .collect();
        let busy: Arc<Vec<AtomicBool>> = Arc::new((0..items).map(|_| AtomicBool::new(false)).collect());
        let overlap = Arc::new(AtomicBool::new(false));

        let handles: Vec<_> = (0..callers)
            .map(|caller| {
                let collection = Arc::clone(&collection);
                let ids = ids.clone();
                let plan = plan.clone();
                let busy = Arc::clone(&busy);
                let overlap = Arc::clone(&overlap);
                thread::spawn(move || {
                    let completions: Vec<_> = plan
                        .iter()
                        .enumerate()
                        .map(|(seq, target)| {
                            let id = ids[*target % ids.len()];
                            let task = append(caller, seq, Arc::clone(&busy), Arc::clone(&overlap));
                            collection.blocking_schedule(id, task).unwrap()
                        })
                        .collect();
                    for completion in completions {
                        completion.blocking_wait().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        prop_assert!(!overlap.load(Ordering::SeqCst));

        let mut total = 0;
        for id in &ids {
            let log = collection
                .blocking_run(*id, Task::new("log", "read", |item: &mut Item<Log>| item.get().cloned().unwrap_or_default()))
                .unwrap();
            total += log.len();

            let mut last_seq: HashMap<usize, usize> = HashMap::new();
            for (caller, seq) in log {
                if let Some(prev) = last_seq.insert(caller, seq) {
                    prop_assert!(prev < seq, "caller {} ran {} after {}", caller, seq, prev);
                }
            }
        }
        prop_assert_eq!(total, plan.len() * callers);

        let report = collection.blocking_collect().unwrap();
        prop_assert_eq!(report.collected, items);
        prop_assert_eq!(sink.count("item collected"), items);
    }
}
