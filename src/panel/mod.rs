//! Control panels: wall-mounted touch sensor, pager button, dimmer knob,
//! indicator LED and speaker.

pub mod device;
pub mod mapper;
pub mod watcher;

pub use device::ControlPanel;
pub use mapper::next_light_state;
pub use watcher::{PanelInputs, PanelWatcher, SharedAdc, SharedPanel};
