use tracing::debug;

use crate::synth::{AudioParam, Oscillator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(u64);

/// A source→gain chain connected to the graph output.
#[derive(Debug)]
pub struct Voice {
    oscillator: Oscillator,
    gain: AudioParam,
}

impl Voice {
    pub fn new(oscillator: Oscillator, gain: AudioParam) -> Self {
        Voice { oscillator, gain }
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    pub fn oscillator_mut(&mut self) -> &mut Oscillator {
        &mut self.oscillator
    }

    pub fn gain(&self) -> &AudioParam {
        &self.gain
    }

    pub fn gain_mut(&mut self) -> &mut AudioParam {
        &mut self.gain
    }

    fn next_sample(&mut self, current_time: f64) -> f32 {
        self.oscillator.generate_wave(current_time) * self.gain.value_at(current_time)
    }
}

/// The processing graph shared between the controller and the audio
/// callback. Its frame counter is the session clock.
#[derive(Debug)]
pub struct AudioGraph {
    sample_rate: f32,
    frame: u64,
    next_id: u64,
    voices: Vec<(VoiceId, Voice)>,
}

impl AudioGraph {
    pub fn new(sample_rate: f32) -> Self {
        AudioGraph {
            sample_rate,
            frame: 0,
            next_id: 0,
            voices: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn connect(&mut self, voice: Voice) -> VoiceId {
        let id = VoiceId(self.next_id);
        self.next_id += 1;
        self.voices.push((id, voice));
        debug!("Connected voice {:?}, {} live", id, self.voices.len());
        id
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices
            .iter()
            .find(|(voice_id, _)| *voice_id == id)
            .map(|(_, voice)| voice)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices
            .iter_mut()
            .find(|(voice_id, _)| *voice_id == id)
            .map(|(_, voice)| voice)
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Removes a voice straight away, without waiting for its stop time.
    pub fn disconnect(&mut self, id: VoiceId) -> Option<Voice> {
        let index = self.voices.iter().position(|(voice_id, _)| *voice_id == id)?;
        debug!("Disconnected voice {:?}", id);
        Some(self.voices.remove(index).1)
    }

    /// Renders interleaved frames into `data`, mixing every live voice into
    /// all channels, then drops voices whose stop time has passed.
    pub fn render(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in data.chunks_mut(channels) {
            let current_time = self.current_time();
            let mixed: f32 = self
                .voices
                .iter_mut()
                .map(|(_, voice)| voice.next_sample(current_time))
                .sum();
            frame.fill(mixed);
            self.frame += 1;
        }

        let now = self.current_time();
        self.voices.retain(|(id, voice)| {
            let finished = voice.oscillator.is_finished(now);
            if finished {
                debug!("Voice {:?} finished at {:.4}s", id, now);
            }
            !finished
        });
        for (_, voice) in self.voices.iter_mut() {
            voice.gain.compact(now);
        }
    }
}
