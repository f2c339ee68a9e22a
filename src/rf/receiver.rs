//! Line acquisition, handler registry and per-channel watcher threads.
//!
//! Lifecycle is encoded in the types: [`LatchedReceiver`] accepts handler
//! registrations and is consumed by [`LatchedReceiver::run`], which hands
//! back a [`RunningReceiver`].  Registering after start or starting twice
//! does not compile.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};

use super::{RfChannel, RfPins};
use crate::app::ports::{EdgeInput, GpioBank};
use crate::cancel::CancellationToken;
use crate::error::{DriveError, InitError};

/// Action run when a channel fires.
pub type Handler = Box<dyn Fn() + Send + 'static>;

const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_RESET_PULSE: Duration = Duration::from_micros(1);

struct ChannelBinding<I> {
    channel: RfChannel,
    input: I,
    handler: Option<Handler>,
}

/// A receiver whose lines are claimed but whose watchers are not running.
pub struct LatchedReceiver<B: GpioBank> {
    reset: B::Output,
    bindings: Vec<ChannelBinding<B::Input>>,
    wait_timeout: Duration,
    reset_pulse: Duration,
}

impl<B: GpioBank> LatchedReceiver<B> {
    /// Claim the reset line (driven low) and the four channel inputs
    /// (rising-edge), in that order.  The first line that cannot be
    /// claimed is reported; lines already claimed are released.
    pub fn new(bank: &mut B, pins: RfPins) -> Result<Self, InitError> {
        let reset = bank
            .claim_output_low(pins.reset)
            .map_err(|source| InitError {
                line: "RF latch reset",
                pin: pins.reset,
                source,
            })?;

        let mut bindings = Vec::with_capacity(RfChannel::ALL.len());
        for channel in RfChannel::ALL {
            let pin = pins.channel(channel);
            let input = bank
                .claim_rising_edge_input(pin)
                .map_err(|source| InitError {
                    line: channel.line_name(),
                    pin,
                    source,
                })?;
            bindings.push(ChannelBinding {
                channel,
                input,
                handler: None,
            });
        }

        info!(
            "RF receiver ready: reset gpio {}, channels A/B/C/D on gpio {}/{}/{}/{}",
            pins.reset, pins.a, pins.b, pins.c, pins.d
        );
        Ok(Self {
            reset,
            bindings,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            reset_pulse: DEFAULT_RESET_PULSE,
        })
    }

    /// Upper bound on each blocking edge wait; also bounds shutdown latency.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Bind `handler` to `channel`, replacing any earlier binding.
    pub fn register_handler(&mut self, channel: RfChannel, handler: impl Fn() + Send + 'static) {
        if let Some(binding) = self.bindings.iter_mut().find(|b| b.channel == channel) {
            if binding.handler.replace(Box::new(handler)).is_some() {
                debug!("RF channel {channel}: handler replaced");
            }
        }
    }

    /// Start one watcher thread per channel.  Watchers stop within one
    /// wait timeout of `cancel` firing.
    pub fn run(self, cancel: &CancellationToken) -> io::Result<RunningReceiver> {
        // Cancelled on its own if a later spawn fails, to unwind the
        // watchers already started.
        let local = cancel.child_token();
        let reset = Arc::new(Mutex::new(self.reset));
        let mut workers = Vec::with_capacity(self.bindings.len());

        for binding in self.bindings {
            let channel = binding.channel;
            let watcher = ChannelWatcher {
                binding,
                reset: Arc::clone(&reset),
                cancel: local.clone(),
                wait_timeout: self.wait_timeout,
                reset_pulse: self.reset_pulse,
            };
            let spawned = thread::Builder::new()
                .name(format!("rf-{}", channel.label().to_ascii_lowercase()))
                .spawn(move || watcher.run());
            match spawned {
                Ok(handle) => workers.push((channel, handle)),
                Err(e) => {
                    error!("RF channel {channel}: failed to spawn watcher: {e}");
                    local.cancel();
                    RunningReceiver { workers }.join();
                    return Err(e);
                }
            }
        }
        Ok(RunningReceiver { workers })
    }
}

/// Watchers of a started receiver.
pub struct RunningReceiver {
    workers: Vec<(RfChannel, JoinHandle<()>)>,
}

impl RunningReceiver {
    /// Wait for every watcher to exit (after cancellation).
    pub fn join(self) {
        for (channel, handle) in self.workers {
            if handle.join().is_err() {
                warn!("RF channel {channel}: watcher panicked");
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Per-channel watcher
// ───────────────────────────────────────────────────────────────

struct ChannelWatcher<I, R> {
    binding: ChannelBinding<I>,
    reset: Arc<Mutex<R>>,
    cancel: CancellationToken,
    wait_timeout: Duration,
    reset_pulse: Duration,
}

impl<I: EdgeInput, R: OutputPin> ChannelWatcher<I, R> {
    fn run(mut self) {
        let channel = self.binding.channel;
        debug!(
            "RF channel {channel}: watching gpio {}",
            self.binding.input.line()
        );
        while !self.cancel.is_cancelled() {
            match self.binding.input.wait_for_rising_edge(self.wait_timeout) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!("RF channel {channel}: {e}");
                    thread::sleep(self.wait_timeout);
                    continue;
                }
            }

            debug!("RF channel {channel}: triggered");
            if let Some(handler) = &self.binding.handler {
                if panic::catch_unwind(AssertUnwindSafe(|| handler())).is_err() {
                    error!("RF channel {channel}: handler panicked");
                }
            }
            // Always clear the latch, or the channel never fires again.
            if let Err(e) = pulse_reset(&self.reset, self.reset_pulse) {
                warn!("RF channel {channel}: {e}");
            }
        }
        debug!("RF channel {channel}: watcher stopped");
    }
}

/// Drive the shared reset line high for `width`, then low.  Both writes
/// are attempted; the first failure is reported.
fn pulse_reset<R: OutputPin>(reset: &Mutex<R>, width: Duration) -> Result<(), DriveError> {
    let mut pin = reset.lock().unwrap_or_else(PoisonError::into_inner);
    let raised = pin.set_high();
    thread::sleep(width);
    let lowered = pin.set_low();
    raised
        .and(lowered)
        .map_err(|e| DriveError::new("RF latch reset", format!("{e:?}")))
}
