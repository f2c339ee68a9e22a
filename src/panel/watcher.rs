//! Panel watcher thread: turns latched panel inputs into controller calls.
//!
//! Both inputs are latched in hardware until the panel resets them, so
//! polling them in turn with half the timeout each never loses a press.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use crate::app::controller::LightController;
use crate::app::ports::{AnalogInput, EdgeInput, LightOutput, PagerNotifier, Speaker};
use crate::cancel::CancellationToken;

use super::device::ControlPanel;

/// A panel shared between its watcher and the RF pager handler.
pub type SharedPanel<P, S, D> = Arc<Mutex<ControlPanel<P, S, D>>>;

/// Dimmer ADC shared by every panel.
pub type SharedAdc = Arc<Mutex<dyn AnalogInput>>;

/// The two latched inputs of a panel.
pub struct PanelInputs<I> {
    pub pager: I,
    pub touch: I,
}

/// Everything one panel's watcher thread needs.
pub struct PanelWatcher<P, S, D, I, O> {
    pub panel: SharedPanel<P, S, D>,
    pub inputs: PanelInputs<I>,
    pub controller: LightController<O>,
    pub notifier: Arc<dyn PagerNotifier>,
    pub dimmer: Option<SharedAdc>,
    pub poll_timeout: Duration,
}

impl<P, S, D, I, O> PanelWatcher<P, S, D, I, O>
where
    P: OutputPin + Send + 'static,
    S: Speaker + 'static,
    D: DelayNs + Send + 'static,
    I: EdgeInput + 'static,
    O: LightOutput + 'static,
{
    /// Start the watcher on its own thread.  It exits within one poll
    /// timeout of `cancel` firing.
    pub fn spawn(self, cancel: CancellationToken) -> io::Result<JoinHandle<()>> {
        let id = self.panel.lock().unwrap_or_else(PoisonError::into_inner).id();
        thread::Builder::new()
            .name(format!("panel-{id}"))
            .spawn(move || self.run(id, &cancel))
    }

    fn run(mut self, id: u8, cancel: &CancellationToken) {
        info!(
            "Panel {id}: watching pager gpio {} and touch gpio {}",
            self.inputs.pager.line(),
            self.inputs.touch.line()
        );
        let slice = self.poll_timeout / 2;
        while !cancel.is_cancelled() {
            if wait_edge(id, "pager", slice, &mut self.inputs.pager) {
                self.panel().on_pager_pressed(&*self.notifier);
            }
            if wait_edge(id, "touch", slice, &mut self.inputs.touch) {
                self.handle_touch(id);
            }
            self.poll_dimmer(id);
        }
        debug!("Panel {id}: watcher stopped");
    }

    /// The cue plays first; the transition is then taken from whatever
    /// state the light is in at that moment.
    fn handle_touch(&self, id: u8) {
        self.panel().play_touch_feedback();
        let next = self.controller.advance();
        debug!("Panel {id}: touch -> {}", next.name);
    }

    fn poll_dimmer(&self, id: u8) {
        let Some(adc) = &self.dimmer else { return };
        let mut adc = adc.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(percent) = self.panel().poll_dimmer(&mut *adc) {
            debug!("Panel {id}: dimmer at {percent}%");
        }
    }

    fn panel(&self) -> MutexGuard<'_, ControlPanel<P, S, D>> {
        self.panel.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A read error is logged and costs one timeout, so a failing line
/// cannot spin the thread.
fn wait_edge(id: u8, what: &str, timeout: Duration, input: &mut impl EdgeInput) -> bool {
    match input.wait_for_rising_edge(timeout) {
        Ok(edge) => edge,
        Err(e) => {
            warn!("Panel {id}: {what} input: {e}");
            thread::sleep(timeout);
            false
        }
    }
}
