use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::synth::{AudioParam, AudioSession, Oscillator, OscillatorWaveform, Voice, VoiceId};

/// The last waveform and volume picked in the UI, whether or not a tone is
/// sounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    pub waveform: OscillatorWaveform,
    pub volume: f32,
}

impl Default for ControlState {
    fn default() -> Self {
        ControlState {
            waveform: OscillatorWaveform::Sine,
            volume: 0.5,
        }
    }
}

/// How a released tone fades out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    /// Seconds from release to silence.
    pub duration: f64,
    /// Gain reached at the end of the ramp. Must be above zero.
    pub floor: f32,
}

impl Default for Fade {
    fn default() -> Self {
        Fade {
            duration: 0.05,
            floor: 0.001,
        }
    }
}

/// Handle to the one sounding voice in the session graph.
#[derive(Debug)]
pub struct ActiveTone {
    voice: VoiceId,
    waveform: OscillatorWaveform,
    volume: f32,
}

impl ActiveTone {
    /// Builds source→gain→output from `control` and starts it now.
    pub fn start(session: &AudioSession, control: &ControlState, frequency: f32) -> Self {
        let now = session.current_time();

        let mut oscillator = Oscillator::builder()
            .frequency(frequency)
            .sample_rate(session.sample_rate())
            .waveform(control.waveform)
            .build();
        let mut gain = AudioParam::new(1.0);
        gain.set_value_at_time(control.volume, now);
        oscillator.start(now);

        let voice = session.connect(Voice::new(oscillator, gain));
        info!(
            "Tone started: {} Hz {} at volume {:.2} ({:?})",
            frequency, control.waveform, control.volume, voice
        );

        ActiveTone {
            voice,
            waveform: control.waveform,
            volume: control.volume,
        }
    }

    pub fn voice(&self) -> VoiceId {
        self.voice
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, session: &AudioSession, volume: f32) {
        self.volume = volume;
        session.with_voice(self.voice, |voice, now| {
            voice.gain_mut().set_value_at_time(volume, now);
        });
        debug!("Tone gain set to {:.2}", volume);
    }

    pub fn set_waveform(&mut self, session: &AudioSession, waveform: OscillatorWaveform) {
        self.waveform = waveform;
        session.with_voice(self.voice, |voice, _| {
            voice.oscillator_mut().set_waveform(waveform);
        });
    }

    /// Fades the voice out and schedules its stop at the end of the fade.
    /// The voice keeps running in the graph until then. Returns the stop time.
    pub fn release(self, session: &AudioSession, fade: &Fade) -> Result<f64> {
        let stop_time = session
            .with_voice(self.voice, |voice, now| -> Result<f64> {
                let end_time = now + fade.duration;
                let current = voice.gain().value_at(now);
                let gain = voice.gain_mut();
                // Anchor the ramp at the current level so it starts from here.
                gain.set_value_at_time(current, now);
                gain.exponential_ramp_to_value_at_time(fade.floor, end_time)?;
                voice.oscillator_mut().stop(end_time);
                Ok(end_time)
            })
            .with_context(|| format!("voice {:?} is no longer in the graph", self.voice))??;
        info!("Tone released, stopping at {:.4}s", stop_time);
        Ok(stop_time)
    }

    /// Drops the voice from the graph at once. For sessions whose clock is
    /// not moving, where a scheduled fade would never play out.
    pub fn discard(self, session: &AudioSession) {
        if session.disconnect(self.voice).is_some() {
            info!("Tone discarded, session not running");
        }
    }
}
