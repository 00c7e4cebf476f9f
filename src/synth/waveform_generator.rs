use crate::synth::OscillatorWaveform;
use lazy_static::lazy_static;
use std::f32::consts::PI;

pub const TWO_PI: f32 = 2.0 * PI;
pub const WAVETABLE_SIZE: usize = 1024;

lazy_static! {
    // Indexed in the same order as `OscillatorWaveform::ALL`.
    static ref WAVETABLES: [[f32; WAVETABLE_SIZE]; 4] = [
        {
            let mut wavetable = [0.0; WAVETABLE_SIZE];
            for (i, sample) in wavetable.iter_mut().enumerate() {
                *sample = ((i as f32 * TWO_PI) / WAVETABLE_SIZE as f32).sin();
            }
            wavetable
        },
        {
            let mut wavetable = [0.0; WAVETABLE_SIZE];
            for (i, sample) in wavetable.iter_mut().enumerate() {
                *sample = if i < WAVETABLE_SIZE / 2 { 1.0 } else { -1.0 };
            }
            wavetable
        },
        {
            let mut wavetable = [0.0; WAVETABLE_SIZE];
            for (i, sample) in wavetable.iter_mut().enumerate() {
                *sample = 2.0 * (i as f32 / WAVETABLE_SIZE as f32) - 1.0;
            }
            wavetable
        },
        {
            let mut wavetable = [0.0; WAVETABLE_SIZE];
            for (i, sample) in wavetable.iter_mut().enumerate() {
                let phase = i as f32 / WAVETABLE_SIZE as f32;
                *sample = if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                };
            }
            wavetable
        },
    ];
}

fn wavetable_for(waveform: OscillatorWaveform) -> &'static [f32; WAVETABLE_SIZE] {
    match waveform {
        OscillatorWaveform::Sine => &WAVETABLES[0],
        OscillatorWaveform::Square => &WAVETABLES[1],
        OscillatorWaveform::Sawtooth => &WAVETABLES[2],
        OscillatorWaveform::Triangle => &WAVETABLES[3],
    }
}

/// Phase accumulator reading from a shared wavetable.
#[derive(Debug)]
pub struct WaveformGenerator {
    waveform: OscillatorWaveform,
    wavetable: &'static [f32; WAVETABLE_SIZE],
    phase: f32,
    phase_inc: f32,
    sample_rate: f32,
}

impl WaveformGenerator {
    pub fn new(waveform: OscillatorWaveform, frequency: f32, sample_rate: f32) -> Self {
        WaveformGenerator {
            waveform,
            wavetable: wavetable_for(waveform),
            phase: 0.0,
            phase_inc: frequency / sample_rate,
            sample_rate,
        }
    }

    pub fn get_waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    /// Swaps the table in place. The phase carries over so the running
    /// signal is not retriggered.
    pub fn set_waveform(&mut self, waveform: OscillatorWaveform) {
        self.waveform = waveform;
        self.wavetable = wavetable_for(waveform);
    }

    pub fn get_sample(&mut self) -> f32 {
        let position = self.phase * WAVETABLE_SIZE as f32;
        let index = (position as usize).min(WAVETABLE_SIZE - 1);
        let frac = position - index as f32;
        let sample = self.wavetable[index];
        let next_sample = self.wavetable[(index + 1) % WAVETABLE_SIZE];
        let interpolated_sample = sample + frac * (next_sample - sample);
        self.update_phase();
        interpolated_sample
    }

    fn update_phase(&mut self) {
        self.phase = (self.phase + self.phase_inc) % 1.0;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn get_frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }
}
