//! Scheduler stress harness
//!
//! Many concurrent callers hammer a handful of items with counter bumps.
//! Each bump reads the item's counter, yields, then writes it back, which
//! would lose updates if two tasks ever ran on one item at once. The report
//! compares the final counters against the number of tasks submitted.

use imgscript_actor::{
    CollectReport, Collection, CollectionConfig, ConfigError, Item, ItemId, NullSink, Task,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Stress run parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressConfig {
    /// Items to create
    pub items: usize,
    /// Tasks each caller submits
    pub tasks_per_caller: usize,
    /// Concurrent callers
    pub callers: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            items: 4,
            tasks_per_caller: 1000,
            callers: 8,
        }
    }
}

/// Outcome of a stress run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressReport {
    /// Parameters the run used
    pub config: StressConfig,
    /// Tasks submitted
    pub expected_total: u64,
    /// Sum of all item counters afterwards
    pub observed_total: u64,
    /// Times a task started while another was running on the same item
    pub overlaps: usize,
    /// Tasks that failed to schedule or run
    pub failed_tasks: usize,
    /// Teardown barrier outcome
    pub collect: CollectReport,
    /// Wall-clock duration
    pub elapsed_ms: u64,
}

impl StressReport {
    /// Check the run saw no lost updates, overlaps or failures
    #[must_use]
    pub fn passed(&self) -> bool {
        self.overlaps == 0
            && self.failed_tasks == 0
            && self.observed_total == self.expected_total
            && self.collect.collected == self.config.items
    }

    /// Human-readable report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();
        let _ = writeln!(report, "=== imgscript Stress Report ===\n");
        let _ = writeln!(report, "Items: {}", self.config.items);
        let _ = writeln!(report, "Callers: {}", self.config.callers);
        let _ = writeln!(report, "Tasks per caller: {}", self.config.tasks_per_caller);
        let _ = writeln!(report, "Expected total: {}", self.expected_total);
        let _ = writeln!(report, "Observed total: {}", self.observed_total);
        let _ = writeln!(report, "Overlaps: {}", self.overlaps);
        let _ = writeln!(report, "Failed tasks: {}", self.failed_tasks);
        let _ = writeln!(
            report,
            "Collected: {} (skipped {})",
            self.collect.collected, self.collect.skipped
        );
        let _ = writeln!(report, "Elapsed: {}ms", self.elapsed_ms);
        let _ = writeln!(
            report,
            "\n=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

struct Probe {
    busy: Vec<AtomicBool>,
    overlaps: AtomicUsize,
}

/// Run the stress scenario
///
/// Per-task log records are discarded; only the summary is traced.
///
/// # Errors
/// - `ConfigError::Invalid` if `collection` fails validation
pub async fn run_stress(
    config: StressConfig,
    collection: CollectionConfig,
) -> Result<StressReport, ConfigError> {
    let started = Instant::now();
    let collection = Arc::new(Collection::<u64>::with_config(
        collection,
        Arc::new(NullSink),
    )?);
    let ids: Vec<ItemId> = (0..config.items)
        .filter_map(|n| collection.add_item(&format!("stress-{n}")).ok())
        .collect();
    let probe = Arc::new(Probe {
        busy: (0..config.items).map(|_| AtomicBool::new(false)).collect(),
        overlaps: AtomicUsize::new(0),
    });
    let failed = Arc::new(AtomicUsize::new(0));

    let mut callers = Vec::with_capacity(config.callers);
    for caller in 0..config.callers {
        let collection = Arc::clone(&collection);
        let ids = ids.clone();
        let probe = Arc::clone(&probe);
        let failed = Arc::clone(&failed);
        callers.push(tokio::spawn(async move {
            let mut completions = Vec::with_capacity(config.tasks_per_caller);
            for n in 0..config.tasks_per_caller {
                let Some(&id) = ids.get((caller + n) % ids.len().max(1)) else {
                    failed.fetch_add(1, Ordering::Relaxed);
                    continue;
                };
                match collection.schedule(id, bump(Arc::clone(&probe))).await {
                    Ok(completion) => completions.push(completion),
                    Err(_) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            for completion in completions {
                if completion.await.is_err() {
                    failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }
    for caller in callers {
        if caller.await.is_err() {
            failed.fetch_add(config.tasks_per_caller, Ordering::Relaxed);
        }
    }

    let mut observed_total = 0;
    for &id in &ids {
        let read = Task::new("stress", "read", |item: &mut Item<u64>| {
            item.get().copied().unwrap_or(0)
        });
        match collection.run(id, read).await {
            Ok(count) => observed_total += count,
            Err(_) => {
                failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    let collect = collection.collect().await.unwrap_or_default();
    let report = StressReport {
        config,
        expected_total: u64::try_from(config.callers * config.tasks_per_caller)
            .unwrap_or(u64::MAX),
        observed_total,
        overlaps: probe.overlaps.load(Ordering::SeqCst),
        failed_tasks: failed.load(Ordering::SeqCst),
        collect,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    tracing::info!(
        items = config.items,
        callers = config.callers,
        tasks = report.expected_total,
        overlaps = report.overlaps,
        passed = report.passed(),
        "stress run finished"
    );
    Ok(report)
}

fn bump(probe: Arc<Probe>) -> Task<u64> {
    Task::new("stress", "bump", move |item: &mut Item<u64>| {
        let busy = &probe.busy[item.id().index()];
        if busy.swap(true, Ordering::SeqCst) {
            probe.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let counter = item.get_or_insert_with(|| 0);
        let seen = *counter;
        std::thread::yield_now();
        *counter = seen + 1;
        busy.store(false, Ordering::SeqCst);
    })
}
