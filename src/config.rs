use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::synth::{ControlState, Fade, OscillatorWaveform};

pub const DEFAULT_CONFIG_PATH: &str = "resources/config/settings.yaml";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tone: ToneSettings,
    pub keybindings: KeyBindings,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneSettings {
    pub frequency: f32,
    pub fade_duration_ms: u64,
    pub fade_floor: f32,
    pub initial_volume: f32,
    pub initial_waveform: OscillatorWaveform,
}

impl Default for ToneSettings {
    fn default() -> Self {
        ToneSettings {
            frequency: 440.0,
            fade_duration_ms: 50,
            fade_floor: 0.001,
            initial_volume: 0.5,
            initial_waveform: OscillatorWaveform::Sine,
        }
    }
}

impl ToneSettings {
    pub fn fade(&self) -> Fade {
        Fade {
            duration: self.fade_duration_ms as f64 / 1000.0,
            floor: self.fade_floor,
        }
    }

    pub fn initial_control(&self) -> ControlState {
        ControlState {
            waveform: self.initial_waveform,
            volume: self.initial_volume,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub press: String,
    pub volume_up: String,
    pub volume_down: String,
    pub volume_step: f32,
    pub waveforms: HashMap<String, OscillatorWaveform>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let waveforms = ["1", "2", "3", "4"]
            .into_iter()
            .map(String::from)
            .zip(OscillatorWaveform::ALL)
            .collect();
        KeyBindings {
            press: "Space".to_string(),
            volume_up: "ArrowUp".to_string(),
            volume_down: "ArrowDown".to_string(),
            volume_step: 0.05,
            waveforms,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Attempting to open the configuration file: '{}'", path.display());
        let mut file = File::open(path)
            .with_context(|| format!("Failed to open config file '{}'", path.display()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let tone = &self.tone;
        ensure!(
            tone.frequency > 0.0 && tone.frequency.is_finite(),
            "tone.frequency must be positive, got {}",
            tone.frequency
        );
        ensure!(tone.fade_duration_ms > 0, "tone.fade_duration_ms must be positive");
        ensure!(
            tone.fade_floor > 0.0 && tone.fade_floor < 1.0,
            "tone.fade_floor must be in (0, 1), got {}",
            tone.fade_floor
        );
        ensure!(
            (0.0..=1.0).contains(&tone.initial_volume),
            "tone.initial_volume must be in [0, 1], got {}",
            tone.initial_volume
        );
        let step = self.keybindings.volume_step;
        ensure!(
            step > 0.0 && step <= 1.0,
            "keybindings.volume_step must be in (0, 1], got {}",
            step
        );
        Ok(())
    }
}
