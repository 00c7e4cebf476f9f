use std::collections::HashMap;

use tracing::{debug, warn};
use winit::keyboard::Key;

use crate::config::{KeyBindings, ToneSettings};
use crate::synth::OscillatorWaveform;
use crate::ui::UiEvent;

/// Keyboard-driven stand-in for a volume slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSlider {
    value: f32,
    step: f32,
}

impl VolumeSlider {
    pub fn new(value: f32, step: f32) -> Self {
        VolumeSlider {
            value: value.clamp(0.0, 1.0),
            step,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn nudge(&mut self, steps: i32) {
        self.value = (self.value + steps as f32 * self.step).clamp(0.0, 1.0);
    }

    /// The slider's value as the text a UI control would report. Parses
    /// back to exactly the same level.
    pub fn text(&self) -> String {
        self.value.to_string()
    }
}

/// Name a key the way the keybindings spell it.
pub fn key_name(key: &Key) -> Option<String> {
    match key {
        Key::Character(text) => Some(text.to_string()),
        Key::Named(named) => Some(format!("{:?}", named)),
        _ => None,
    }
}

/// Turns window input into [`UiEvent`]s. Keys are identified by name:
/// the typed text for character keys (`"1"`) and the variant name for
/// named keys (`"Space"`, `"ArrowUp"`).
#[derive(Debug)]
pub struct WindowInput {
    press_key: String,
    volume_up: String,
    volume_down: String,
    waveforms: HashMap<String, OscillatorWaveform>,
    slider: VolumeSlider,
}

impl WindowInput {
    pub fn new(tone: &ToneSettings, keybindings: &KeyBindings) -> Self {
        WindowInput {
            press_key: keybindings.press.clone(),
            volume_up: keybindings.volume_up.clone(),
            volume_down: keybindings.volume_down.clone(),
            waveforms: keybindings.waveforms.clone(),
            slider: VolumeSlider::new(tone.initial_volume, keybindings.volume_step),
        }
    }

    pub fn slider(&self) -> &VolumeSlider {
        &self.slider
    }

    pub fn ready(&self) -> UiEvent {
        UiEvent::Ready {
            slider: self.slider.text(),
        }
    }

    pub fn on_button(&mut self, pressed: bool) -> UiEvent {
        if pressed {
            UiEvent::Press
        } else {
            UiEvent::Release
        }
    }

    pub fn on_pointer_leave(&mut self) -> UiEvent {
        UiEvent::PointerLeave
    }

    /// A window losing focus mid-press never sees the release, so it counts
    /// as the pointer leaving.
    pub fn on_focus_changed(&mut self, focused: bool) -> Option<UiEvent> {
        if focused {
            None
        } else {
            Some(self.on_pointer_leave())
        }
    }

    pub fn on_key(&mut self, key: &str, pressed: bool) -> Option<UiEvent> {
        debug!("Key {} {}", key, if pressed { "pressed" } else { "released" });

        if key == self.press_key {
            return Some(self.on_button(pressed));
        }
        if !pressed {
            return None;
        }

        if key == self.volume_up {
            self.slider.nudge(1);
            return Some(UiEvent::VolumeInput(self.slider.text()));
        }
        if key == self.volume_down {
            self.slider.nudge(-1);
            return Some(UiEvent::VolumeInput(self.slider.text()));
        }
        if let Some(waveform) = self.waveforms.get(key) {
            return Some(UiEvent::WaveformSelected(waveform.to_string()));
        }

        warn!("No binding for key {}", key);
        None
    }
}
