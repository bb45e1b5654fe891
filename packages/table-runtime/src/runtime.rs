//! Tick loop draining the request channel.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use table_core::{Database, ServiceConfig, TableError};
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::api_handlers::ApiHandlers;
use crate::api_request::ApiRequest;

/// Counters exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Ticks executed so far
    pub ticks: u64,
    /// Requests applied
    pub processed: u64,
    /// Requests answered with `Overloaded` because the queue was full
    pub rejected: u64,
}

/// Single-threaded request loop.
///
/// Requests are applied strictly in arrival order, at most
/// `max_api_requests_per_tick` per tick.
pub struct Runtime {
    /// Configuration
    config: ServiceConfig,
    /// Tick duration
    tick_duration: Duration,
    /// API request receiver
    api_rx: mpsc::Receiver<ApiRequest>,
    /// Requests waiting for a tick
    queue: VecDeque<ApiRequest>,
    /// Maximum queue capacity (tickrate * 100)
    queue_capacity: usize,
    /// Set once every sender is gone
    disconnected: bool,
    stats: RuntimeStats,
    /// API handlers
    api_handlers: ApiHandlers,
}

impl Runtime {
    /// Create a new runtime
    pub fn new(
        database: Arc<Database>,
        config: ServiceConfig,
        api_rx: mpsc::Receiver<ApiRequest>,
    ) -> Self {
        let tick_duration = Duration::from_secs_f64(1.0 / config.tickrate.max(1) as f64);
        let queue_capacity = crate::channel_capacity(&config);
        let api_handlers = ApiHandlers::new(database, &config);

        Self {
            config,
            tick_duration,
            api_rx,
            queue: VecDeque::new(),
            queue_capacity,
            disconnected: false,
            stats: RuntimeStats::default(),
            api_handlers,
        }
    }

    /// Returns the current counters.
    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Number of requests waiting for a tick.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// True once all senders are dropped and nothing is left to apply.
    pub fn is_finished(&self) -> bool {
        self.disconnected && self.queue.is_empty()
    }

    /// Drain API channel into the queue, respecting capacity.
    fn drain_api_channel(&mut self) {
        loop {
            match self.api_rx.try_recv() {
                Ok(req) => {
                    if self.queue.len() >= self.queue_capacity {
                        self.stats.rejected += 1;
                        tracing::warn!(
                            "Request queue full, rejecting {} on {}",
                            req.kind(),
                            req.table()
                        );
                        let _ = req.into_response().send(Err(TableError::Overloaded(
                            "request queue is full".to_string(),
                        )));
                        continue;
                    }
                    self.queue.push_back(req);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        tracing::debug!("All request senders dropped");
                    }
                    self.disconnected = true;
                    break;
                }
            }
        }
    }

    /// Process queued API requests up to limit and time budget.
    fn process_queued_requests(&mut self, tick_start: Instant) {
        let max_requests = self.config.max_api_requests_per_tick;
        let mut processed = 0;

        while processed < max_requests {
            if tick_start.elapsed() > self.tick_duration {
                break;
            }
            let Some(req) = self.queue.pop_front() else {
                break;
            };
            self.api_handlers.handle_api_request(req);
            processed += 1;
        }
        self.stats.processed += u64::from(processed);
    }

    /// Execute a single tick of the runtime
    pub fn tick(&mut self) {
        let tick_start = Instant::now();

        self.drain_api_channel();
        self.process_queued_requests(tick_start);

        self.stats.ticks += 1;
        self.sleep_remaining(tick_start);
    }

    /// Run ticks until the request channel closes and the queue is drained.
    pub fn run(&mut self) {
        tracing::info!(
            "Runtime running at {} Hz, {} requests per tick",
            self.config.tickrate,
            self.config.max_api_requests_per_tick
        );
        while !self.is_finished() {
            self.tick();
        }
    }

    /// Sleep remaining tick time
    fn sleep_remaining(&self, tick_start: Instant) {
        if let Some(remaining) = self.tick_duration.checked_sub(tick_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }
}
