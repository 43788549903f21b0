//! Periodic pool refresh
//!
//! Re-reads the pool on a fixed interval until shutdown. A failed refresh
//! keeps the previous snapshot in place; the fallback keeps using it.

use crate::logging::LogEmoji;
use std::future::Future;
use std::time::Duration;
use tidepool_amm::{PoolOverview, QuotingEngine, SettlementGateway};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Outcome counters for a finished refresh loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub succeeded: u64,
    pub failed: u64,
}

/// Refresh every `period` and hand each new overview to `report`
///
/// The first refresh runs immediately. Returns once `shutdown` resolves.
pub async fn run_refresh_loop<G, S, R>(
    engine: &QuotingEngine<G>,
    period: Duration,
    shutdown: S,
    mut report: R,
) -> RefreshStats
where
    G: SettlementGateway,
    S: Future<Output = ()>,
    R: FnMut(&PoolOverview),
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stats = RefreshStats::default();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(
                    succeeded = stats.succeeded,
                    failed = stats.failed,
                    "Refresh loop stopped"
                );
                return stats;
            }
            _ = ticker.tick() => {
                match engine.refresh().await {
                    Ok(_) => {
                        stats.succeeded += 1;
                        match engine.pool_overview().await {
                            Ok(overview) => report(&overview),
                            Err(e) => warn!("{} Overview unavailable: {}", LogEmoji::WARNING, e),
                        }
                    }
                    Err(e) => {
                        stats.failed += 1;
                        crate::log_error!("Pool refresh failed: {}", e);
                    }
                }
            }
        }
    }
}
