use std::fmt;
use std::str::FromStr;

use serde_derive::{Deserialize, Serialize};
use tracing::debug;

use crate::synth::waveform_generator::WaveformGenerator;

#[derive(Copy, Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OscillatorWaveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl OscillatorWaveform {
    pub const ALL: [OscillatorWaveform; 4] = [
        OscillatorWaveform::Sine,
        OscillatorWaveform::Square,
        OscillatorWaveform::Sawtooth,
        OscillatorWaveform::Triangle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OscillatorWaveform::Sine => "sine",
            OscillatorWaveform::Square => "square",
            OscillatorWaveform::Sawtooth => "sawtooth",
            OscillatorWaveform::Triangle => "triangle",
        }
    }
}

impl fmt::Display for OscillatorWaveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OscillatorWaveform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|waveform| waveform.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown waveform '{s}'"))
    }
}

/// The signal source of a voice. Produces samples only between its
/// scheduled start and stop times.
#[derive(Debug)]
pub struct Oscillator {
    waveform_generator: WaveformGenerator,
    start_time: Option<f64>,
    stop_time: Option<f64>,
}

impl Oscillator {
    pub fn new(frequency: f32, sample_rate: f32, waveform: OscillatorWaveform) -> Self {
        Oscillator {
            waveform_generator: WaveformGenerator::new(waveform, frequency, sample_rate),
            start_time: None,
            stop_time: None,
        }
    }

    pub fn builder() -> OscillatorBuilder {
        OscillatorBuilder::default()
    }

    /// Next sample at `current_time`, or silence outside the playing window.
    /// The phase only advances while playing.
    pub fn generate_wave(&mut self, current_time: f64) -> f32 {
        if self.is_playing(current_time) {
            self.waveform_generator.get_sample()
        } else {
            0.0
        }
    }

    pub fn start(&mut self, start_time: f64) {
        debug!("Oscillator start at {:.4}s", start_time);
        self.start_time = Some(start_time);
    }

    pub fn stop(&mut self, stop_time: f64) {
        debug!("Oscillator stop at {:.4}s", stop_time);
        self.stop_time = Some(stop_time);
    }

    pub fn is_playing(&self, current_time: f64) -> bool {
        match self.start_time {
            Some(start_time) => {
                start_time <= current_time && !self.is_finished(current_time)
            }
            None => false,
        }
    }

    pub fn is_finished(&self, current_time: f64) -> bool {
        self.stop_time
            .is_some_and(|stop_time| current_time >= stop_time)
    }

    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.stop_time
    }

    pub fn set_waveform(&mut self, waveform: OscillatorWaveform) {
        debug!("Setting waveform to {:?}", waveform);
        self.waveform_generator.set_waveform(waveform);
    }

    pub fn get_frequency(&self) -> f32 {
        self.waveform_generator.get_frequency()
    }

    pub fn get_waveform(&self) -> OscillatorWaveform {
        self.waveform_generator.get_waveform()
    }
}

pub struct OscillatorBuilder {
    frequency: f32,
    sample_rate: f32,
    waveform: OscillatorWaveform,
}

impl Default for OscillatorBuilder {
    fn default() -> Self {
        OscillatorBuilder {
            frequency: 440.0,
            sample_rate: 44100.0,
            waveform: OscillatorWaveform::Sine,
        }
    }
}

impl OscillatorBuilder {
    pub fn build(self) -> Oscillator {
        Oscillator::new(self.frequency, self.sample_rate, self.waveform)
    }

    pub fn frequency(mut self, frequency: f32) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn waveform(mut self, waveform: OscillatorWaveform) -> Self {
        self.waveform = waveform;
        self
    }
}
