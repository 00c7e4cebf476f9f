use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait};
use tracing::{info, warn};

use crate::synth::output::{AudioOutput, CpalOutput, NullOutput};
use crate::synth::{AudioGraph, Voice, VoiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Suspended,
    Running,
}

/// The platform audio context: the shared graph plus the device output
/// feeding from it. Opened suspended and resumed on demand.
pub struct AudioSession {
    graph: Arc<Mutex<AudioGraph>>,
    output: Box<dyn AudioOutput>,
    state: SessionState,
}

impl AudioSession {
    pub fn new(graph: Arc<Mutex<AudioGraph>>, output: Box<dyn AudioOutput>) -> Self {
        AudioSession {
            graph,
            output,
            state: SessionState::Suspended,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Starts the device without waiting on it. A failure is logged and the
    /// session stays suspended.
    pub fn resume(&mut self) {
        match self.output.resume() {
            Ok(()) => {
                info!("Audio session running");
                self.state = SessionState::Running;
            }
            Err(e) => warn!("Failed to resume audio session: {:#}", e),
        }
    }

    pub fn current_time(&self) -> f64 {
        self.graph().current_time()
    }

    pub fn sample_rate(&self) -> f32 {
        self.graph().sample_rate()
    }

    pub fn connect(&self, voice: Voice) -> VoiceId {
        self.graph().connect(voice)
    }

    /// Runs `f` on a live voice together with the current time.
    pub fn with_voice<R>(&self, id: VoiceId, f: impl FnOnce(&mut Voice, f64) -> R) -> Option<R> {
        let mut graph = self.graph();
        let now = graph.current_time();
        graph.voice_mut(id).map(|voice| f(voice, now))
    }

    pub fn disconnect(&self, id: VoiceId) -> Option<Voice> {
        self.graph().disconnect(id)
    }

    pub fn voice_count(&self) -> usize {
        self.graph().voice_count()
    }

    /// Renders interleaved frames on the caller's thread. Only meaningful for
    /// sessions without a device pulling from the graph.
    pub fn render(&self, data: &mut [f32], channels: usize) {
        self.graph().render(data, channels);
    }

    fn graph(&self) -> MutexGuard<'_, AudioGraph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Opens audio sessions for the controller.
pub trait AudioBackend {
    fn open(&self) -> Result<AudioSession>;
}

/// The default host's default output device.
#[derive(Debug, Default)]
pub struct CpalBackend;

impl AudioBackend for CpalBackend {
    fn open(&self) -> Result<AudioSession> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No output device available")?;
        let config = device
            .default_output_config()
            .context("Failed to query the default output config")?;
        info!(
            "Opening output device {:?} at {} Hz, {} channels",
            device.name().unwrap_or_default(),
            config.sample_rate().0,
            config.channels()
        );

        let graph = Arc::new(Mutex::new(AudioGraph::new(config.sample_rate().0 as f32)));
        let output = CpalOutput::build(&device, &config, graph.clone())?;
        Ok(AudioSession::new(graph, Box::new(output)))
    }
}

/// Sessions with no device. Time only moves when the owner calls
/// [`AudioSession::render`].
#[derive(Debug, Clone, Copy)]
pub struct OfflineBackend {
    pub sample_rate: f32,
}

impl Default for OfflineBackend {
    fn default() -> Self {
        OfflineBackend {
            sample_rate: 44100.0,
        }
    }
}

impl AudioBackend for OfflineBackend {
    fn open(&self) -> Result<AudioSession> {
        let graph = Arc::new(Mutex::new(AudioGraph::new(self.sample_rate)));
        Ok(AudioSession::new(graph, Box::new(NullOutput)))
    }
}
