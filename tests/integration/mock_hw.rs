//! Mock hardware adapters for integration tests.
//!
//! Every mock records into shared, cloneable logs so tests can assert on
//! the full call history (and its ordering) without touching real GPIO,
//! PWM or SPI.

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};

use wakelight::app::events::AppEvent;
use wakelight::app::ports::{
    AnalogInput, Clock, EdgeInput, EventSink, GpioBank, LightOutput, PagerNotifier, PagerSource,
    Speaker,
};
use wakelight::error::{DriveError, EdgeReadError, LineError};
use wakelight::light::LightState;

// ── Shared timeline ───────────────────────────────────────────

/// One observable side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Pin { label: &'static str, high: bool },
    Tone(u32),
    Silence,
    DelayMs(u32),
    Notify(PagerSource),
    Handler(&'static str),
}

/// Ordered record of side effects shared by several mocks.
#[derive(Debug, Clone, Default)]
pub struct Timeline(Arc<Mutex<Vec<Step>>>);

#[allow(dead_code)]
impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, step: Step) {
        self.0.lock().unwrap().push(step);
    }

    pub fn steps(&self) -> Vec<Step> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    pub fn count(&self, step: &Step) -> usize {
        self.steps().iter().filter(|s| *s == step).count()
    }

    /// Positions of every `Pin { label, high: true }`.
    pub fn rises(&self, label: &str) -> Vec<usize> {
        self.steps()
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, Step::Pin { label: l, high: true } if *l == label))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn position(&self, step: &Step) -> Option<usize> {
        self.steps().iter().position(|s| s == step)
    }
}

/// Poll `cond` until it holds or `limit` passes.
#[allow(dead_code)]
pub fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

// ── Light output ──────────────────────────────────────────────

/// LightOutput that records every write.
#[derive(Clone, Default)]
pub struct MockOutput {
    writes: Arc<Mutex<Vec<LightState>>>,
    fail: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<LightState> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<LightState> {
        self.writes.lock().unwrap().last().copied()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl LightOutput for MockOutput {
    fn apply(&mut self, state: &LightState) -> Result<(), DriveError> {
        self.writes.lock().unwrap().push(*state);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DriveError::new("red", "mock failure"));
        }
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<AppEvent>>>);

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Clock that only moves when told to.
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }

    pub fn set(&self, at: Duration) {
        *self.offset.lock().unwrap() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }
}

// ── Digital output ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// embedded-hal output that writes `Step::Pin` into a timeline.
#[derive(Clone)]
pub struct MockPin {
    label: &'static str,
    timeline: Timeline,
    fail: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn new(label: &'static str, timeline: &Timeline) -> Self {
        Self {
            label,
            timeline: timeline.clone(),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn write(&mut self, high: bool) -> Result<(), MockPinError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MockPinError);
        }
        self.timeline.push(Step::Pin {
            label: self.label,
            high,
        });
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), MockPinError> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), MockPinError> {
        self.write(true)
    }
}

/// Output whose writes always succeed and are discarded.
#[allow(dead_code)]
pub struct NullPin;

impl ErrorType for NullPin {
    type Error = Infallible;
}

impl OutputPin for NullPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

// ── Edge input ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Edge,
    Fail,
}

/// Test-side handle that fires a [`MockEdgeInput`].
#[derive(Clone)]
pub struct EdgeTrigger(mpsc::Sender<Signal>);

#[allow(dead_code)]
impl EdgeTrigger {
    pub fn fire(&self) {
        let _ = self.0.send(Signal::Edge);
    }

    pub fn fail(&self) {
        let _ = self.0.send(Signal::Fail);
    }
}

pub struct MockEdgeInput {
    line: u8,
    signals: mpsc::Receiver<Signal>,
}

#[allow(dead_code)]
impl MockEdgeInput {
    pub fn new(line: u8) -> (Self, EdgeTrigger) {
        let (tx, rx) = mpsc::channel();
        (Self { line, signals: rx }, EdgeTrigger(tx))
    }
}

impl EdgeInput for MockEdgeInput {
    fn line(&self) -> u8 {
        self.line
    }

    fn wait_for_rising_edge(&mut self, timeout: Duration) -> Result<bool, EdgeReadError> {
        match self.signals.recv_timeout(timeout) {
            Ok(Signal::Edge) => Ok(true),
            Ok(Signal::Fail) => Err(EdgeReadError::new(format!("gpio {}", self.line), "mock failure")),
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                Ok(false)
            }
        }
    }
}

// ── GPIO bank ─────────────────────────────────────────────────

/// GpioBank handing out mock lines.  Outputs log into the shared
/// timeline under the label `"gpio<N>"`.
pub struct MockBank {
    pub timeline: Timeline,
    pub claimed: Vec<u8>,
    busy: HashSet<u8>,
    triggers: HashMap<u8, EdgeTrigger>,
    outputs: HashMap<u8, MockPin>,
}

#[allow(dead_code)]
impl MockBank {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
            claimed: Vec::new(),
            busy: HashSet::new(),
            triggers: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    /// Make claiming `pin` fail with [`LineError::Busy`].
    pub fn mark_busy(&mut self, pin: u8) {
        self.busy.insert(pin);
    }

    pub fn trigger(&self, pin: u8) -> EdgeTrigger {
        self.triggers[&pin].clone()
    }

    pub fn output(&self, pin: u8) -> MockPin {
        self.outputs[&pin].clone()
    }

    fn check(&mut self, pin: u8) -> Result<(), LineError> {
        self.claimed.push(pin);
        if self.busy.contains(&pin) {
            return Err(LineError::Busy(pin));
        }
        Ok(())
    }
}

/// Static labels for the outputs tests care about.
fn output_label(pin: u8) -> &'static str {
    match pin {
        17 => "rf-reset",
        7 | 10 => "panel-reset",
        _ => "gpio",
    }
}

impl GpioBank for MockBank {
    type Output = MockPin;
    type Input = MockEdgeInput;

    fn claim_output_low(&mut self, pin: u8) -> Result<MockPin, LineError> {
        self.check(pin)?;
        let out = MockPin::new(output_label(pin), &self.timeline);
        self.outputs.insert(pin, out.clone());
        Ok(out)
    }

    fn claim_rising_edge_input(&mut self, pin: u8) -> Result<MockEdgeInput, LineError> {
        self.check(pin)?;
        let (input, trigger) = MockEdgeInput::new(pin);
        self.triggers.insert(pin, trigger);
        Ok(input)
    }
}

// ── Panel peripherals ─────────────────────────────────────────

pub struct MockSpeaker {
    timeline: Timeline,
}

#[allow(dead_code)]
impl MockSpeaker {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
        }
    }
}

impl Speaker for MockSpeaker {
    fn tone(&mut self, hz: u32) -> Result<(), DriveError> {
        self.timeline.push(Step::Tone(hz));
        Ok(())
    }

    fn silence(&mut self) -> Result<(), DriveError> {
        self.timeline.push(Step::Silence);
        Ok(())
    }
}

/// Delay that records millisecond waits and returns immediately.
pub struct MockDelay {
    timeline: Timeline,
}

#[allow(dead_code)]
impl MockDelay {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.timeline.push(Step::DelayMs(ms));
    }
}

/// ADC with settable per-channel readings.
#[derive(Default)]
pub struct MockAdc {
    pub readings: HashMap<u8, u16>,
}

impl AnalogInput for MockAdc {
    fn read_channel(&mut self, channel: u8) -> Result<u16, LineError> {
        self.readings
            .get(&channel)
            .copied()
            .ok_or(LineError::NoSuchLine(channel))
    }
}

/// Notifier that writes `Step::Notify` into a timeline.
pub struct TimelineNotifier(pub Timeline);

impl PagerNotifier for TimelineNotifier {
    fn notify(&self, source: PagerSource) {
        self.0.push(Step::Notify(source));
    }
}
