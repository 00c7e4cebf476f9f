use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use tracing::{error, info};

use crate::synth::AudioGraph;

/// The device end of a session.
pub trait AudioOutput {
    fn resume(&mut self) -> Result<()>;
}

/// A cpal output stream pulling frames from the shared graph.
pub struct CpalOutput {
    stream: cpal::Stream,
}

impl CpalOutput {
    pub fn build(
        device: &cpal::Device,
        config: &cpal::SupportedStreamConfig,
        graph: Arc<Mutex<AudioGraph>>,
    ) -> Result<Self> {
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(device, &config.config(), graph)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(device, &config.config(), graph)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(device, &config.config(), graph)?,
            sample_format => bail!("Unsupported sample format {sample_format:?}"),
        };
        Ok(CpalOutput { stream })
    }
}

impl AudioOutput for CpalOutput {
    fn resume(&mut self) -> Result<()> {
        info!("Starting output stream");
        self.stream.play()?;
        Ok(())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    graph: Arc<Mutex<AudioGraph>>,
) -> Result<cpal::Stream>
where
    T: Sample + SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();

    let err_fn = |err: cpal::StreamError| error!("An error occurred on the audio stream: {}", err);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.clear();
            scratch.resize(data.len(), 0.0);

            // Silence while the graph is poisoned.
            if let Ok(mut graph) = graph.lock() {
                graph.render(&mut scratch, channels);
            }

            for (out, sample) in data.iter_mut().zip(scratch.iter()) {
                *out = T::from_sample(*sample);
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}

/// Output with no device behind it. The owner renders the graph directly.
#[derive(Debug, Default)]
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn resume(&mut self) -> Result<()> {
        Ok(())
    }
}
