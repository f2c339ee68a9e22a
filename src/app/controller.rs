//! Light controller: single owner of the fixture's output.
//!
//! [`LightController`] serialises every write to the LED strip behind one
//! mutex and owns at most one wake-up ramp session at a time.  It is a
//! cheap cloneable handle, so RF handlers, panel watchers and the console
//! loop can each hold one.
//!
//! ```text
//!  RF handlers ──┐
//!  panels ───────┼──▶ ┌──────────────────────┐ ──▶ LightOutput
//!  console ──────┘    │   LightController    │ ──▶ EventSink
//!                     │ state · ramp session │
//!                     └──────────┬───────────┘
//!                                │ spawns / halts
//!                           ramp worker thread
//! ```
//!
//! Ramp sessions carry an id.  The worker re-checks that its id is still
//! the active one under the lock before every write, so once
//! [`set_immediate`](LightController::set_immediate) or
//! [`halt_wakeup`](LightController::halt_wakeup) returns, no stale ramp
//! write can land on the output.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::adapters::log_sink::LogEventSink;
use crate::adapters::time::MonotonicClock;
use crate::error::LightError;
use crate::light::{ChannelMix, LightName, LightSettings, LightState};
use crate::panel::next_light_state;

use super::commands::LightCommand;
use super::events::{AppEvent, RampStop};
use super::ports::{Clock, EventSink, LightOutput};

// ───────────────────────────────────────────────────────────────
// Ramp configuration
// ───────────────────────────────────────────────────────────────

/// Timing of a wake-up ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampConfig {
    /// Default ramp length used by [`LightCommand::Wakeup`].
    pub duration: Duration,
    /// Interval between intermediate writes.
    pub tick: Duration,
}

impl RampConfig {
    /// Number of intermediate steps for a ramp of `duration`.
    pub fn ticks_for(&self, duration: Duration) -> u32 {
        if self.tick.is_zero() {
            return 1;
        }
        let ticks = duration.as_nanos().div_ceil(self.tick.as_nanos()).max(1);
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }
}

impl Default for RampConfig {
    /// 30 minute ramp with a write every 30 seconds.
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30 * 60),
            tick: Duration::from_secs(30),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Shared state
// ───────────────────────────────────────────────────────────────

struct RampSession {
    id: u64,
    target: LightState,
    halt: mpsc::Sender<()>,
    worker: JoinHandle<()>,
}

struct Shared<O> {
    light: LightState,
    settings: LightSettings,
    session: Option<RampSession>,
    next_session: u64,
    output: O,
    sink: Box<dyn EventSink>,
}

impl<O: LightOutput> Shared<O> {
    /// Record and write `target`.  A failed write is logged; the recorded
    /// state still moves so the next request starts from what was asked.
    fn drive(&mut self, target: LightState) {
        let from = self.light;
        self.light = target;
        if let Err(e) = self.output.apply(&target) {
            warn!("Light output write failed: {e}");
        }
        if from != target {
            self.sink.emit(&AppEvent::LightChanged { from, to: target });
        }
    }

    fn owns_session(&self, id: u64) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == id)
    }

    /// Detach the active session (if any) and tell its worker to stop.
    /// The caller joins the returned handle after releasing the lock.
    fn end_session(&mut self, reason: RampStop) -> Option<JoinHandle<()>> {
        let session = self.session.take()?;
        // The worker may already be waiting on the lock; the id check
        // stops it if the channel message is missed.
        let _ = session.halt.send(());

        // A halted ramp keeps its `Wakeup` name so the next touch goes full.
        info!(
            "Wake-up ramp {} ({reason:?}) at {} (target {})",
            session.id, self.light, session.target
        );
        self.sink.emit(&AppEvent::WakeupStopped {
            reason,
            at: self.light,
        });
        Some(session.worker)
    }
}

struct Inner<O> {
    shared: Mutex<Shared<O>>,
    ramp: RampConfig,
    clock: Arc<dyn Clock>,
}

impl<O> Inner<O> {
    fn lock(&self) -> MutexGuard<'_, Shared<O>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ───────────────────────────────────────────────────────────────
// LightController
// ───────────────────────────────────────────────────────────────

/// Handle to the fixture.  Clones share the same output and session.
pub struct LightController<O> {
    inner: Arc<Inner<O>>,
}

impl<O> Clone for LightController<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: LightOutput + 'static> LightController<O> {
    /// Controller with the log event sink and the monotonic system clock.
    ///
    /// Nothing is written until the first request; the recorded state
    /// starts as off.
    pub fn new(output: O, settings: LightSettings, ramp: RampConfig) -> Self {
        Self::with_parts(
            output,
            settings,
            ramp,
            Box::new(LogEventSink::new()),
            Arc::new(MonotonicClock),
        )
    }

    pub fn with_parts(
        output: O,
        settings: LightSettings,
        ramp: RampConfig,
        sink: Box<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    light: LightState::off(),
                    settings,
                    session: None,
                    next_session: 1,
                    output,
                    sink,
                }),
                ramp,
                clock,
            }),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn current(&self) -> LightState {
        self.inner.lock().light
    }

    pub fn is_wakeup_active(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    pub fn settings(&self) -> LightSettings {
        self.inner.lock().settings
    }

    pub fn ramp_config(&self) -> RampConfig {
        self.inner.ramp
    }

    // ── Immediate changes ─────────────────────────────────────

    /// Drive `target` now.  A running ramp is superseded; when this
    /// returns its worker has exited and will not write again.
    pub fn set_immediate(&self, target: LightState) {
        let worker = {
            let mut shared = self.inner.lock();
            let worker = shared.end_session(RampStop::Superseded);
            shared.drive(target);
            worker
        };
        join_worker(worker);
    }

    /// Advance the off → low → full → off cycle atomically against the
    /// current state.  Returns the state that was driven.
    pub fn advance(&self) -> LightState {
        let (next, worker) = {
            let mut shared = self.inner.lock();
            let worker = shared.end_session(RampStop::Superseded);
            let next = next_light_state(&shared.light, &shared.settings);
            shared.drive(next);
            (next, worker)
        };
        join_worker(worker);
        next
    }

    // ── Wake-up ramp ──────────────────────────────────────────

    /// Start a ramp from dark to `target` over `duration`.
    ///
    /// Returns `false` (and changes nothing) when a ramp is already
    /// active or the worker thread cannot be spawned.
    pub fn start_wakeup(&self, duration: Duration, target: LightState) -> bool {
        let mut shared = self.inner.lock();
        if let Some(active) = &shared.session {
            debug!("Wake-up ramp {} already running, ignoring request", active.id);
            return false;
        }

        let id = shared.next_session;
        let (halt_tx, halt_rx) = mpsc::channel();
        // Logged only; the worker derives each level from elapsed time.
        let step: ChannelMix = target.divided(self.inner.ramp.ticks_for(duration));
        let plan = RampPlan {
            id,
            started: self.inner.clock.now(),
            duration,
            target,
        };

        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(format!("wakeup-{id}"))
            .spawn(move || run_ramp(&inner, &plan, &halt_rx));
        let worker = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Failed to spawn wake-up ramp thread: {e}");
                return false;
            }
        };

        shared.next_session += 1;
        shared.session = Some(RampSession {
            id,
            target,
            halt: halt_tx,
            worker,
        });
        shared.drive(target.scaled(0.0, LightName::Wakeup));
        info!(
            "Wake-up ramp {id} started: {duration:?} to {target} (step r={} g={} w={} b={})",
            step.red, step.green, step.white, step.blue
        );
        shared.sink.emit(&AppEvent::WakeupStarted { duration, target });
        true
    }

    /// Stop the active ramp, leaving the output at its last level.
    /// Returns whether a ramp was running.
    pub fn halt_wakeup(&self) -> bool {
        let worker = self.inner.lock().end_session(RampStop::Halted);
        let was_active = worker.is_some();
        join_worker(worker);
        was_active
    }

    // ── Configuration ─────────────────────────────────────────

    /// Replace the full-power mix (white forced to full scale).
    pub fn configure_colors(&self, mix: ChannelMix) {
        let mut shared = self.inner.lock();
        shared.settings.configure_colors(mix);
        debug!("Full-power preset now {}", shared.settings.full());
    }

    pub fn configure_dim(&self, fraction: f64) -> Result<(), LightError> {
        let mut shared = self.inner.lock();
        shared.settings.configure_dim(fraction)?;
        debug!("Low-power preset now {}", shared.settings.low());
        Ok(())
    }

    // ── Commands ──────────────────────────────────────────────

    /// Interpret a [`LightCommand`].  Everything except `Wakeup` ends a
    /// running ramp before acting; `Toggle` does so inside [`advance`].
    ///
    /// [`advance`]: Self::advance
    pub fn handle_command(&self, cmd: LightCommand) {
        debug!("Command: {cmd}");
        if cmd.halts_ramp() {
            self.halt_wakeup();
        }
        let settings = self.settings();
        match cmd {
            LightCommand::On => self.set_immediate(settings.full()),
            LightCommand::Off => self.set_immediate(settings.off()),
            LightCommand::Dim => self.set_immediate(settings.low()),
            LightCommand::Toggle => {
                self.advance();
            }
            LightCommand::Wakeup => {
                self.start_wakeup(self.inner.ramp.duration, settings.full());
            }
            LightCommand::Halt => {}
            LightCommand::Color(mix) => {
                self.configure_colors(mix);
                self.reapply_preset();
            }
            LightCommand::DimLevel(fraction) => match self.configure_dim(fraction) {
                Ok(()) => self.reapply_preset(),
                Err(e) => warn!("Command {cmd} rejected: {e}"),
            },
        }
    }

    /// Redrive a lit preset after its settings changed.
    fn reapply_preset(&self) {
        let mut shared = self.inner.lock();
        let preset = match shared.light.name {
            LightName::Full => shared.settings.full(),
            LightName::Low => shared.settings.low(),
            LightName::Off | LightName::Wakeup => return,
        };
        if preset != shared.light {
            shared.drive(preset);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Ramp worker
// ───────────────────────────────────────────────────────────────

struct RampPlan {
    id: u64,
    started: Instant,
    duration: Duration,
    target: LightState,
}

impl RampPlan {
    fn elapsed(&self, clock: &dyn Clock) -> Duration {
        clock.now().saturating_duration_since(self.started)
    }
}

fn run_ramp<O: LightOutput>(inner: &Inner<O>, plan: &RampPlan, halt: &mpsc::Receiver<()>) {
    loop {
        let remaining = plan.duration.saturating_sub(plan.elapsed(&*inner.clock));
        match halt.recv_timeout(inner.ramp.tick.min(remaining)) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                debug!("Wake-up ramp {} worker stopping", plan.id);
                return;
            }
        }

        let mut shared = inner.lock();
        if !shared.owns_session(plan.id) {
            return;
        }

        let elapsed = plan.elapsed(&*inner.clock);
        if elapsed >= plan.duration {
            shared.drive(LightState {
                name: LightName::Full,
                ..plan.target
            });
            // Our own handle; dropping it detaches this thread.
            shared.session = None;
            info!("Wake-up ramp {} complete", plan.id);
            shared.sink.emit(&AppEvent::WakeupCompleted { target: plan.target });
            return;
        }

        let progress = elapsed.as_secs_f64() / plan.duration.as_secs_f64();
        shared.drive(plan.target.scaled(progress, LightName::Wakeup));
    }
}

fn join_worker(worker: Option<JoinHandle<()>>) {
    let Some(handle) = worker else { return };
    if handle.thread().id() == thread::current().id() {
        return;
    }
    if handle.join().is_err() {
        warn!("Wake-up ramp worker panicked");
    }
}
