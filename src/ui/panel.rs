use std::fmt;

use crate::synth::OscillatorWaveform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active(OscillatorWaveform),
    Inactive,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active(waveform) => write!(f, "active, waveform={waveform}"),
            Status::Inactive => f.write_str("inactive"),
        }
    }
}

/// Where the controller reports what it is doing.
pub trait Panel {
    fn show_status(&mut self, status: &Status);
    fn show_volume(&mut self, label: &str);
}
