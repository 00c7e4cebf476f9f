pub mod event;
pub mod input;
pub mod panel;

pub use event::{parse_volume, volume_label, UiEvent};
pub use input::{key_name, VolumeSlider, WindowInput};
pub use panel::{Panel, Status};
