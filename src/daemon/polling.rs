use crate::api::{fetch_all, GameStreams, StreamDirectory, TokenCache};
use crate::core::error::PollError;
use crate::core::live_set::LiveSetTracker;
use crate::core::models::Category;
use crate::core::store::StateStore;
use crate::delivery::{Delivery, DeliveryTarget};
use crate::notify::NotificationBatcher;
use anyhow::Result;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyRunning,
    Disabled,
    NoChannel,
    NoFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Completed {
        live: usize,
        new: usize,
        delivered: usize,
        failed_deliveries: usize,
    },
    Skipped(SkipReason),
    /// The target filter changed while this tick was fetching.
    Superseded,
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickOutcome::Completed {
                live,
                new,
                delivered,
                failed_deliveries,
            } => {
                write!(f, "Found {live} streams - {new} new, {delivered} messages sent")?;
                if *failed_deliveries > 0 {
                    write!(f, ", {failed_deliveries} failed")?;
                }
                Ok(())
            }
            TickOutcome::Skipped(SkipReason::AlreadyRunning) => f.write_str("Poll already running"),
            TickOutcome::Skipped(SkipReason::Disabled) => f.write_str("Polling is disabled"),
            TickOutcome::Skipped(SkipReason::NoChannel) => f.write_str("No channel set"),
            TickOutcome::Skipped(SkipReason::NoFilter) => f.write_str("No game set"),
            TickOutcome::Superseded => f.write_str("Game changed during poll, results discarded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryChoice {
    Selected(Category),
    NotFound,
    Ambiguous(usize),
}

impl CategoryChoice {
    pub fn describe(&self, requested: &str) -> String {
        match self {
            CategoryChoice::Selected(category) => {
                format!("Game set to '{}' ({})", category.name, category.id)
            }
            CategoryChoice::NotFound => format!("No games found for the name '{requested}'"),
            CategoryChoice::Ambiguous(_) => format!(
                "Multiple games found for the name '{requested}' - please be more specific"
            ),
        }
    }
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PollOrchestrator {
    tokens: TokenCache,
    directory: Arc<dyn StreamDirectory>,
    delivery: Arc<dyn Delivery>,
    batcher: NotificationBatcher,
    store: StateStore,
    tracker: Mutex<LiveSetTracker>,
    running: AtomicBool,
}

impl PollOrchestrator {
    pub fn new(
        tokens: TokenCache,
        directory: Arc<dyn StreamDirectory>,
        delivery: Arc<dyn Delivery>,
        batcher: NotificationBatcher,
        store: StateStore,
    ) -> Self {
        Self {
            tokens,
            directory,
            delivery,
            batcher,
            store,
            tracker: Mutex::new(LiveSetTracker::new()),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Runs one poll unless another is in flight, in which case it is skipped.
    /// Shared by the timer and the manual trigger.
    pub async fn tick(&self) -> Result<TickOutcome, PollError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Poll already running, skipping tick");
            return Ok(TickOutcome::Skipped(SkipReason::AlreadyRunning));
        }
        let _guard = RunningGuard(&self.running);

        match self.run_cycle().await {
            Ok(outcome) => {
                tracing::debug!(%outcome, "Poll finished");
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error polling streams");
                Err(e)
            }
        }
    }

    async fn run_cycle(&self) -> Result<TickOutcome, PollError> {
        let (state, epoch) = {
            let tracker = self.tracker.lock().await;
            (self.store.snapshot().await, tracker.epoch())
        };

        if !state.enabled {
            tracing::debug!("Not finding Twitch streams - disabled");
            return Ok(TickOutcome::Skipped(SkipReason::Disabled));
        }
        let Some(channel_id) = state.channel_id else {
            tracing::debug!("Not finding Twitch streams - no channel set");
            return Ok(TickOutcome::Skipped(SkipReason::NoChannel));
        };
        let Some(game_id) = state.game_id else {
            tracing::debug!("Not finding Twitch streams - no game set");
            return Ok(TickOutcome::Skipped(SkipReason::NoFilter));
        };
        let filter_name = state.game_name.unwrap_or_else(|| game_id.clone());

        tracing::info!(game_id = %game_id, "Finding Twitch streams");
        let token = self.tokens.token().await?;
        let streams = fetch_all(&GameStreams {
            directory: self.directory.as_ref(),
            token: &token,
            game_id: &game_id,
        })
        .await?;

        let delta = {
            let mut tracker = self.tracker.lock().await;
            if tracker.epoch() != epoch {
                tracing::info!(game_id = %game_id, "Game changed during poll, discarding results");
                return Ok(TickOutcome::Superseded);
            }
            tracker.compute_delta(streams)
        };

        let messages = self.batcher.batch(&delta);
        let target = DeliveryTarget {
            channel_id,
            filter_name,
        };

        let mut delivered = 0;
        let mut failed_deliveries = 0;
        for message in &messages {
            match self.delivery.deliver(&target, message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed_deliveries += 1;
                    tracing::warn!(
                        channel = self.delivery.name(),
                        kind = message.kind(),
                        error = %e,
                        "Failed to deliver message"
                    );
                }
            }
        }

        Ok(TickOutcome::Completed {
            live: delta.total_live,
            new: delta.items.len(),
            delivered,
            failed_deliveries,
        })
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.store.set_enabled(enabled).await
    }

    pub async fn set_channel(&self, channel_id: String) -> Result<()> {
        self.store.set_channel_id(channel_id).await
    }

    /// Switches the target filter and restarts baselining. Holding the tracker
    /// lock keeps a concurrent tick from seeing the new filter with the old live set.
    pub async fn set_target_filter(&self, category: Category) -> Result<()> {
        let mut tracker = self.tracker.lock().await;
        self.store.set_game(category.id, category.name).await?;
        tracker.reset();
        Ok(())
    }

    /// Looks up a category by name and makes it the target when the match is unique.
    pub async fn select_category(&self, name: &str) -> Result<CategoryChoice> {
        let token = self.tokens.token().await?;
        let mut categories = self.directory.find_categories(&token, name).await?;

        match categories.len() {
            0 => Ok(CategoryChoice::NotFound),
            1 => {
                let category = categories.remove(0);
                self.set_target_filter(category.clone()).await?;
                Ok(CategoryChoice::Selected(category))
            }
            n => Ok(CategoryChoice::Ambiguous(n)),
        }
    }
}

pub async fn run_polling_loop(
    orchestrator: Arc<PollOrchestrator>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Polling loop started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Polling loop shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                // Failures are already logged; the next tick starts from scratch.
                let _ = orchestrator.tick().await;
            }
        }
    }
}
