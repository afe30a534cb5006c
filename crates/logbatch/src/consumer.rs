// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batching consumer
//!
//! Pulls envelopes from an inbound stream, decodes them, buffers the records
//! and hands full batches to a sink.
//!
//! # Operation
//!
//! Each iteration waits on whichever is ready first:
//!
//! 1. the next inbound envelope (or the stream closing)
//! 2. the idle timer
//!
//! | Event                    | Action                                         | Next state                 |
//! |--------------------------|------------------------------------------------|----------------------------|
//! | envelope, decode fails   | log, count, discard                            | `Running`                  |
//! | envelope, buffer < size  | append                                         | `Running`                  |
//! | envelope, buffer = size  | append, flush, reset idle timer                | `Running`                  |
//! | stream closed            | flush remainder                                | `Terminated(SourceClosed)` |
//! | idle timer fired         | flush remainder                                | `Terminated(IdleTimeout)`  |
//!
//! With [`IdlePolicy::FlushAndContinue`] the idle row instead rearms the
//! timer and stays `Running`.
//!
//! Delivery is at-most-once: envelopes are consumed on receipt, and a batch
//! the sink rejects is logged and dropped.

use crate::accumulator::BatchAccumulator;
use crate::config::{ConfigError, ConsumerConfig, IdlePolicy};
use crate::inbound::Inbound;
use crate::record::{decode, RawEnvelope};
use crate::sink::Sink;
use crate::timer::IdleTimer;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Consumer lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Running,
    Terminated(TerminationReason),
}

/// Why a run ended. Neither is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The inbound stream signalled it is exhausted
    SourceClosed,
    /// No flush happened for a full idle timeout
    IdleTimeout,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::SourceClosed => write!(f, "source closed"),
            TerminationReason::IdleTimeout => write!(f, "idle timeout"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FlushTrigger {
    Threshold,
    Idle,
    SourceClosed,
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushTrigger::Threshold => write!(f, "size threshold"),
            FlushTrigger::Idle => write!(f, "idle timeout"),
            FlushTrigger::SourceClosed => write!(f, "source closed"),
        }
    }
}

enum Event {
    Delivery(RawEnvelope),
    Closed,
    IdleExpired,
}

/// Consumer statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Envelopes received from the inbound stream
    pub records_received: u64,
    /// Envelopes dropped because they failed to decode
    pub records_dropped: u64,
    /// Records stored by successful sink calls
    pub records_persisted: u64,
    /// Records lost with a failed batch
    pub records_lost: u64,
    /// Batches handed to the sink (successful or not)
    pub batches_flushed: u64,
    /// Batches the sink rejected
    pub batches_failed: u64,
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub stats: ConsumerStats,
    pub termination: TerminationReason,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn batches_flushed(&self) -> u64 {
        self.stats.batches_flushed
    }

    pub fn records_dropped(&self) -> u64 {
        self.stats.records_dropped
    }
}

/// Batching consumer
///
/// # Type Parameters
///
/// - `I` -- Inbound stream
/// - `K` -- Batch sink
pub struct BatchConsumer<I: Inbound, K: Sink> {
    config: ConsumerConfig,
    inbound: I,
    sink: K,
    accumulator: BatchAccumulator,
    stats: ConsumerStats,
}

impl<I: Inbound, K: Sink> BatchConsumer<I, K> {
    /// Create a consumer over already-live inbound and sink handles
    pub fn new(config: ConsumerConfig, inbound: I, sink: K) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            accumulator: BatchAccumulator::new(config.batch_size),
            config,
            inbound,
            sink,
            stats: ConsumerStats::default(),
        })
    }

    /// Run until the inbound stream closes or the idle timer ends the run.
    ///
    /// Consumes the consumer: a terminated run cannot be restarted.
    pub async fn run(mut self) -> RunReport {
        tracing::info!(
            "BatchConsumer started (batch_size={}, idle_timeout={:?}, idle_policy={:?})",
            self.config.batch_size,
            self.config.idle_timeout,
            self.config.idle_policy
        );

        let started = Instant::now();
        let mut timer = IdleTimer::start(self.config.idle_timeout);

        let termination = loop {
            let event = tokio::select! {
                envelope = self.inbound.recv() => match envelope {
                    Some(envelope) => Event::Delivery(envelope),
                    None => Event::Closed,
                },
                _ = timer.expired() => Event::IdleExpired,
            };

            if let ConsumerState::Terminated(reason) = self.handle(event, &mut timer) {
                break reason;
            }
        };

        let report = RunReport {
            stats: self.stats,
            termination,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            "BatchConsumer finished ({}): {} batches flushed ({} failed), {} records persisted, {} dropped",
            report.termination,
            report.stats.batches_flushed,
            report.stats.batches_failed,
            report.stats.records_persisted,
            report.stats.records_dropped
        );

        report
    }

    fn handle(&mut self, event: Event, timer: &mut IdleTimer) -> ConsumerState {
        match event {
            Event::Delivery(envelope) => {
                self.on_delivery(envelope, timer);
                ConsumerState::Running
            }
            Event::Closed => {
                tracing::info!("Inbound stream closed");
                self.flush(FlushTrigger::SourceClosed);
                ConsumerState::Terminated(TerminationReason::SourceClosed)
            }
            Event::IdleExpired => {
                tracing::info!("Idle timeout reached ({:?})", timer.duration());
                self.flush(FlushTrigger::Idle);
                match self.config.idle_policy {
                    IdlePolicy::Terminate => {
                        ConsumerState::Terminated(TerminationReason::IdleTimeout)
                    }
                    IdlePolicy::FlushAndContinue => {
                        timer.reset();
                        ConsumerState::Running
                    }
                }
            }
        }
    }

    fn on_delivery(&mut self, envelope: RawEnvelope, timer: &mut IdleTimer) {
        self.stats.records_received += 1;

        let record = match decode(&envelope.payload) {
            Ok(record) => record,
            Err(e) => {
                self.stats.records_dropped += 1;
                tracing::warn!("Dropping delivery {}: {}", envelope.delivery_tag, e);
                return;
            }
        };

        self.accumulator.append(record);
        tracing::trace!(
            "Buffered delivery {} ({}/{})",
            envelope.delivery_tag,
            self.accumulator.size(),
            self.accumulator.batch_size()
        );

        if self.accumulator.is_full() {
            self.flush(FlushTrigger::Threshold);
            timer.reset();
        }
    }

    fn flush(&mut self, trigger: FlushTrigger) {
        let Some(batch) = self.accumulator.drain() else {
            tracing::debug!("Nothing buffered on {} flush", trigger);
            return;
        };

        let count = batch.len() as u64;
        self.stats.batches_flushed += 1;
        tracing::info!("Flushing batch of {} records ({})", count, trigger);

        match self.sink.insert(&batch) {
            Ok(()) => {
                self.stats.records_persisted += count;
                tracing::info!("Batch of {} records persisted", count);
            }
            Err(e) => {
                self.stats.batches_failed += 1;
                self.stats.records_lost += count;
                tracing::error!("Discarding batch of {} records: {}", count, e);
            }
        }
    }
}
