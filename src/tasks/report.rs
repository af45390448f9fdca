//! Cache Report Task
//!
//! Background task that periodically sweeps the cache back under capacity and
//! logs its occupancy.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::ByteCache;

/// Spawns a background task that reports cache state at a fixed interval.
///
/// Eviction picks its victims from a snapshot, so concurrent writers can
/// leave usage slightly above capacity once a pass finishes. Each tick runs
/// `free_memory` to catch that, then logs entry count, usage and hit rate.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `interval` - Time between reports; a zero interval is raised to one second
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_report_task(cache: Arc<ByteCache>, interval: Duration) -> JoinHandle<()> {
    let interval = if interval.is_zero() {
        Duration::from_secs(1)
    } else {
        interval
    };

    tokio::spawn(async move {
        info!("Starting cache report task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let evicted = cache.free_memory();
            if evicted > 0 {
                debug!("Report sweep evicted {} entries", evicted);
            }

            let stats = cache.stats();
            info!(
                "Cache report: {} entries, {}/{} bytes ({:.1}%), hit rate {:.2}, {} evictions",
                stats.total_entries,
                stats.usage,
                stats.capacity,
                stats.utilization() * 100.0,
                stats.hit_rate(),
                stats.evictions
            );
        }
    })
}
