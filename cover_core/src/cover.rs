//! The movement controller (`Cover`).
//!
//! Owns the time-based position estimate for one relay pair and runs the
//! move-to-position, stop and calibration procedures. The hardware gives no
//! feedback: the estimate is a free-running approximation that only
//! calibration corrects.
//!
//! Locking:
//! - `section` is the exclusive section, held for a whole movement or
//!   calibration so requests are serialized per cover.
//! - `estimate` is locked only for short reads and writes, so `stop` can
//!   preempt a movement that is sleeping between ticks.
//! - `active` holds the cancel handle of the newest movement request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use cover_traits::clock::Clock;
use cover_traits::{CommandPublisher, PositionStore};
use crossbeam_channel as xch;
use eyre::WrapErr;

use crate::cancel::{self, CancelHandle, CancelToken};
use crate::config::{ControllerCfg, CoverSpec};
use crate::error::{CoverError, Result};
use crate::interpolate::{
    MAX_POSITION, MIN_POSITION, clamp_target, direction_for, progress_percent, reached, to_percent,
    travelled,
};
use crate::state::{CoverState, Direction, MoveOutcome, MoveReport};
use crate::store_error::map_store_error;

/// Notifications buffered per observer before new ones are dropped.
const OBSERVER_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, Default)]
struct Estimate {
    position: Option<u8>,
    direction: Direction,
    /// When the cover last went Idle. A movement interrupted mid-tick
    /// stops its estimate here.
    halted_at: Option<Instant>,
}

#[inline]
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Cover {
    spec: CoverSpec,
    timing: ControllerCfg,
    publisher: Arc<dyn CommandPublisher + Send + Sync>,
    store: Arc<dyn PositionStore + Send + Sync>,
    clock: Arc<dyn Clock + Send + Sync>,
    section: Mutex<()>,
    estimate: Mutex<Estimate>,
    active: Mutex<Option<CancelHandle>>,
    observers: Mutex<Vec<xch::Sender<CoverState>>>,
    last_store_error: Mutex<Option<CoverError>>,
}

impl core::fmt::Debug for Cover {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let est = *lock(&self.estimate);
        f.debug_struct("Cover")
            .field("id", &self.spec.id)
            .field("position", &est.position)
            .field("direction", &est.direction)
            .finish()
    }
}

impl Cover {
    pub(crate) fn from_parts(
        spec: CoverSpec,
        timing: ControllerCfg,
        publisher: Arc<dyn CommandPublisher + Send + Sync>,
        store: Arc<dyn PositionStore + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            spec,
            timing,
            publisher,
            store,
            clock,
            section: Mutex::new(()),
            estimate: Mutex::new(Estimate::default()),
            active: Mutex::new(None),
            observers: Mutex::new(Vec::new()),
            last_store_error: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &CoverSpec {
        &self.spec
    }

    /// Current estimate; `None` until `restore` ran.
    pub fn position(&self) -> Option<u8> {
        lock(&self.estimate).position
    }

    pub fn direction(&self) -> Direction {
        lock(&self.estimate).direction
    }

    pub fn is_opening(&self) -> bool {
        self.direction() == Direction::Opening
    }

    pub fn is_closing(&self) -> bool {
        self.direction() == Direction::Closing
    }

    pub fn is_stopped(&self) -> bool {
        self.direction() == Direction::Idle
    }

    pub fn is_closed(&self) -> bool {
        self.position() == Some(MIN_POSITION)
    }

    pub fn state(&self) -> CoverState {
        let est = *lock(&self.estimate);
        CoverState {
            id: self.spec.id.clone(),
            position: est.position,
            direction: est.direction,
        }
    }

    /// Most recent persistence failure, if any.
    pub fn last_store_error(&self) -> Option<CoverError> {
        lock(&self.last_store_error).clone()
    }

    /// Receive a `CoverState` after every estimate change and stop.
    /// Delivery is best-effort: a full or dropped receiver loses updates.
    pub fn subscribe(&self) -> xch::Receiver<CoverState> {
        let (tx, rx) = xch::bounded(OBSERVER_BUFFER);
        lock(&self.observers).push(tx);
        rx
    }

    /// Load the persisted estimate (0 when nothing was stored) and go Idle.
    pub fn restore(&self) -> Result<u8> {
        let loaded = self
            .store
            .load(&self.spec.id)
            .map_err(|e| map_store_error(&*e))
            .wrap_err_with(|| format!("restore position of cover {:?}", self.spec.id))?;
        let position = loaded.unwrap_or(MIN_POSITION).min(MAX_POSITION);
        {
            let mut est = lock(&self.estimate);
            est.position = Some(position);
            est.direction = Direction::Idle;
        }
        tracing::info!(cover = %self.spec.id, position, stored = loaded.is_some(), "position restored");
        Ok(position)
    }

    pub fn open(&self) -> MoveReport {
        self.set_position(i32::from(MAX_POSITION))
    }

    pub fn close(&self) -> MoveReport {
        self.set_position(i32::from(MIN_POSITION))
    }

    /// Stop any movement: cancel the in-flight request, go Idle, publish STOP.
    /// Never touches the position and never waits for the exclusive section.
    pub fn stop(&self) {
        let interrupted = lock(&self.active).take();
        self.halt();
        if let Some(h) = &interrupted {
            h.cancel();
            tracing::debug!(cover = %self.spec.id, "movement cancelled by stop");
        }
    }

    /// Move to `target` percent (clamped to 0..=100), estimating position
    /// from elapsed time.
    ///
    /// The newest request wins: any running movement is cancelled first and
    /// unwinds (persisting its own estimate) before this one takes the
    /// exclusive section. Transport and store failures are logged, never
    /// returned; the cover always ends Idle with STOP published.
    pub fn set_position(&self, target: i32) -> MoveReport {
        let (handle, token) = cancel::pair();
        let previous = lock(&self.active).replace(handle);
        self.halt();
        if let Some(prev) = &previous {
            prev.cancel();
        }

        if let Some(prev) = previous {
            if prev.wait(self.timing.cancel_ack_timeout) {
                tracing::debug!(cover = %self.spec.id, "previous movement unwound");
            } else {
                tracing::warn!(
                    cover = %self.spec.id,
                    timeout_ms = self.timing.cancel_ack_timeout.as_millis() as u64,
                    "previous movement did not acknowledge cancel in time"
                );
            }
        }

        let _section = lock(&self.section);
        let report = if token.is_cancelled() {
            tracing::debug!(cover = %self.spec.id, target, "request superseded before it started");
            MoveReport {
                outcome: MoveOutcome::Superseded,
                position: self.position().unwrap_or(MIN_POSITION),
                elapsed: Duration::ZERO,
            }
        } else {
            self.run_move(clamp_target(target), &token)
        };
        self.finish(&token);
        token.acknowledge();
        report
    }

    /// Re-anchor the estimate at fully closed by driving the cover to both
    /// physical limits. Holds the exclusive section throughout and cannot be
    /// cancelled mid-sequence.
    pub fn calibrate(&self) -> MoveReport {
        let _section = lock(&self.section);
        let start = self.clock.now();
        let slack = self.timing.calibration_slack;
        let settle = self.timing.calibration_settle;
        tracing::info!(cover = %self.spec.id, "calibration start");

        self.set_direction(Direction::Idle);
        self.publish(&self.spec.open_payload);
        self.clock.sleep(self.spec.opening_time + slack);
        self.publish(&self.spec.stop_payload);
        self.clock.sleep(settle);
        self.publish(&self.spec.close_payload);
        self.clock.sleep(self.spec.closing_time + slack);
        self.publish(&self.spec.stop_payload);
        self.clock.sleep(settle);

        lock(&self.estimate).position = Some(MIN_POSITION);
        self.persist(MIN_POSITION);
        self.announce();

        let elapsed = self.clock.now().saturating_duration_since(start);
        tracing::info!(cover = %self.spec.id, elapsed_ms = elapsed.as_millis() as u64, "calibration complete");
        MoveReport {
            outcome: MoveOutcome::Calibrated,
            position: MIN_POSITION,
            elapsed,
        }
    }

    fn run_move(&self, target: u8, token: &CancelToken) -> MoveReport {
        let initial = {
            let mut est = lock(&self.estimate);
            let p = est.position.unwrap_or_else(|| {
                tracing::debug!(cover = %self.spec.id, "no restored estimate; assuming closed");
                MIN_POSITION
            });
            est.position = Some(p);
            p
        };
        let start = self.clock.now();
        let direction = direction_for(initial, target);
        self.set_direction(direction);
        let (budget, payload) = match direction {
            Direction::Opening => (self.spec.opening_time, &self.spec.open_payload),
            _ => (self.spec.closing_time, &self.spec.close_payload),
        };
        tracing::info!(
            cover = %self.spec.id,
            initial,
            target,
            %direction,
            budget_ms = budget.as_millis() as u64,
            "movement start"
        );
        self.publish(payload);

        let mut exact = f64::from(initial);
        let mut position = initial;
        let outcome = loop {
            let elapsed = self.clock.now().saturating_duration_since(start);
            if elapsed >= budget {
                break MoveOutcome::TimeBudgetElapsed;
            }
            if reached(exact, target, direction) {
                break MoveOutcome::TargetReached;
            }
            if token.is_cancelled() || self.direction() != direction {
                break MoveOutcome::Interrupted;
            }

            self.clock.sleep(self.timing.tick);

            // A stop that landed during the sleep ends travel at the halt
            // instant, not at the end of the tick.
            let now = self.clock.now();
            let (interrupted, end) = {
                let est = lock(&self.estimate);
                if token.is_cancelled() || est.direction != direction {
                    let end = est
                        .halted_at
                        .filter(|t| *t >= start)
                        .map_or(now, |t| t.min(now));
                    (true, end)
                } else {
                    (false, now)
                }
            };
            let elapsed = end.saturating_duration_since(start);
            exact = travelled(
                initial,
                target,
                direction,
                progress_percent(elapsed, budget),
            );
            position = to_percent(exact);
            lock(&self.estimate).position = Some(position);
            tracing::trace!(cover = %self.spec.id, position, elapsed_ms = elapsed.as_millis() as u64, interrupted, "tick");
            self.announce();
            if interrupted {
                break MoveOutcome::Interrupted;
            }
        };

        self.persist(position);
        let elapsed = self.clock.now().saturating_duration_since(start);
        tracing::info!(
            cover = %self.spec.id,
            position,
            %outcome,
            elapsed_ms = elapsed.as_millis() as u64,
            "movement end"
        );
        MoveReport {
            outcome,
            position,
            elapsed,
        }
    }

    /// Final step of every movement request: clear our own cancel handle
    /// (never a newer request's), then go Idle and publish STOP.
    fn finish(&self, token: &CancelToken) {
        {
            let mut slot = lock(&self.active);
            if slot.as_ref().is_some_and(|h| h.is_for(token)) {
                *slot = None;
            }
        }
        self.halt();
    }

    fn halt(&self) {
        {
            let mut est = lock(&self.estimate);
            est.direction = Direction::Idle;
            est.halted_at = Some(self.clock.now());
        }
        self.publish(&self.spec.stop_payload);
        self.announce();
    }

    fn set_direction(&self, direction: Direction) {
        lock(&self.estimate).direction = direction;
    }

    /// Publish to the command topic if the transport is up. Failures are
    /// logged and swallowed; time-keeping carries on regardless.
    fn publish(&self, payload: &str) {
        let topic = self.spec.command_topic.as_str();
        if !self.publisher.is_available() {
            tracing::error!(cover = %self.spec.id, topic, payload, "transport is not available; command dropped");
            return;
        }
        match self.publisher.publish(topic, payload) {
            Ok(()) => tracing::debug!(cover = %self.spec.id, topic, payload, "command published"),
            Err(e) => {
                let err = CoverError::Publish(e.to_string());
                tracing::error!(cover = %self.spec.id, topic, payload, error = %err, "command not delivered");
            }
        }
    }

    /// Persist `position`; a failure is logged once and remembered, never raised.
    fn persist(&self, position: u8) {
        match self.store.save(&self.spec.id, position) {
            Ok(()) => {
                *lock(&self.last_store_error) = None;
            }
            Err(e) => {
                let err = map_store_error(&*e);
                tracing::error!(cover = %self.spec.id, position, error = %err, "failed to persist position");
                *lock(&self.last_store_error) = Some(err);
            }
        }
    }

    fn announce(&self) {
        let state = self.state();
        lock(&self.observers).retain(|tx| {
            !matches!(
                tx.try_send(state.clone()),
                Err(xch::TrySendError::Disconnected(_))
            )
        });
    }
}
