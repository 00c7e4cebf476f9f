pub mod audio_param;
pub mod graph;
pub mod oscillator;
pub mod output;
pub mod session;
pub mod tone;
pub mod waveform_generator;

pub use audio_param::{AudioParam, ParamEvent};
pub use graph::{AudioGraph, Voice, VoiceId};
pub use oscillator::{Oscillator, OscillatorWaveform};
pub use output::{AudioOutput, CpalOutput, NullOutput};
pub use session::{AudioBackend, AudioSession, CpalBackend, OfflineBackend, SessionState};
pub use tone::{ActiveTone, ControlState, Fade};
