use tracing::debug;

/// Events the UI collaborator feeds to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Press,
    Release,
    PointerLeave,
    /// Raw slider text, expected to parse to a level in [0, 1].
    VolumeInput(String),
    /// One of `sine`, `square`, `sawtooth`, `triangle`.
    WaveformSelected(String),
    /// The UI is up. Carries the slider's starting value.
    Ready { slider: String },
}

/// Parses slider text into a level. NaN and garbage are rejected, anything
/// else is clamped to [0, 1].
pub fn parse_volume(input: &str) -> Option<f32> {
    match input.trim().parse::<f32>() {
        Ok(level) if !level.is_nan() => Some(level.clamp(0.0, 1.0)),
        _ => {
            debug!("Rejecting volume input {:?}", input);
            None
        }
    }
}

/// Integer percent label for a level, e.g. `50%`.
pub fn volume_label(level: f32) -> String {
    format!("{}%", (level * 100.0).round() as u32)
}
