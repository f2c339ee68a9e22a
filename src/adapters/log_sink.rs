//! Log-based adapters.
//!
//! [`LogEventSink`] implements [`EventSink`] by writing structured
//! application events through the `log` facade.  [`LogPagerNotifier`]
//! stands in for an upstream pager service by logging each page; a hub
//! or push-notification adapter would implement the same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, PagerNotifier, PagerSource};

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::LightChanged { from, to } => {
                info!("LIGHT | {} -> {}", from.name, to);
            }
            AppEvent::WakeupStarted { duration, target } => {
                info!(
                    "WAKEUP | started, {}s to {}",
                    duration.as_secs(),
                    target
                );
            }
            AppEvent::WakeupCompleted { target } => {
                info!("WAKEUP | complete at {}", target);
            }
            AppEvent::WakeupStopped { reason, at } => {
                info!("WAKEUP | stopped ({:?}) at {}", reason, at);
            }
        }
    }
}

/// Pager notifier that only records pages in the log.
#[derive(Debug, Default)]
pub struct LogPagerNotifier {
    node: String,
}

impl LogPagerNotifier {
    pub fn new(node: impl Into<String>) -> Self {
        Self { node: node.into() }
    }
}

impl PagerNotifier for LogPagerNotifier {
    fn notify(&self, source: PagerSource) {
        match source {
            PagerSource::Panel(id) => info!("PAGE | {} panel {}", self.node, id),
            PagerSource::Remote => info!("PAGE | {} remote", self.node),
        }
    }
}
