use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::ToneSettings;
use crate::synth::{
    ActiveTone, AudioBackend, AudioSession, ControlState, Fade, OscillatorWaveform, SessionState,
};
use crate::ui::{parse_volume, volume_label, Panel, Status, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneState {
    Idle,
    Sounding,
}

/// Hold-to-play tone. Owns the audio session (opened on first use), the
/// sounding tone if any, and the UI's last waveform/volume choice.
pub struct ToneController<B: AudioBackend, P: Panel> {
    backend: B,
    panel: P,
    frequency: f32,
    fade: Fade,
    control: ControlState,
    session: Option<AudioSession>,
    tone: Option<ActiveTone>,
}

impl<B: AudioBackend, P: Panel> ToneController<B, P> {
    pub fn new(backend: B, panel: P, settings: &ToneSettings) -> Self {
        ToneController {
            backend,
            panel,
            frequency: settings.frequency,
            fade: settings.fade(),
            control: settings.initial_control(),
            session: None,
            tone: None,
        }
    }

    pub fn state(&self) -> ToneState {
        match self.tone {
            Some(_) => ToneState::Sounding,
            None => ToneState::Idle,
        }
    }

    pub fn control(&self) -> ControlState {
        self.control
    }

    pub fn active_tone(&self) -> Option<&ActiveTone> {
        self.tone.as_ref()
    }

    pub fn session(&self) -> Option<&AudioSession> {
        self.session.as_ref()
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn handle(&mut self, event: UiEvent) -> Result<()> {
        debug!("Handling {:?}", event);
        match event {
            UiEvent::Press => self.activate()?,
            UiEvent::Release | UiEvent::PointerLeave => self.deactivate()?,
            UiEvent::VolumeInput(input) => match parse_volume(&input) {
                Some(level) => self.set_volume(level),
                None => warn!("Ignoring volume input {:?}", input),
            },
            UiEvent::WaveformSelected(name) => match name.parse() {
                Ok(waveform) => self.set_waveform(waveform),
                Err(e) => warn!("Ignoring waveform selection: {}", e),
            },
            UiEvent::Ready { slider } => self.ready(&slider),
        }
        Ok(())
    }

    pub fn activate(&mut self) -> Result<()> {
        if self.tone.is_some() {
            debug!("Activate while sounding, releasing the previous tone first");
            self.release_tone()?;
        }

        let session = match self.session.take() {
            Some(session) => session,
            None => {
                info!("Opening audio session");
                self.backend.open()?
            }
        };
        let session = self.session.insert(session);
        if session.state() == SessionState::Suspended {
            session.resume();
        }

        self.tone = Some(ActiveTone::start(session, &self.control, self.frequency));
        self.panel.show_status(&Status::Active(self.control.waveform));
        Ok(())
    }

    pub fn deactivate(&mut self) -> Result<()> {
        if self.tone.is_none() {
            return Ok(());
        }
        self.release_tone()?;
        self.panel.show_status(&Status::Inactive);
        Ok(())
    }

    pub fn set_volume(&mut self, level: f32) {
        self.control.volume = level;
        if let (Some(tone), Some(session)) = (self.tone.as_mut(), self.session.as_ref()) {
            tone.set_volume(session, level);
        }
        self.panel.show_volume(&volume_label(level));
    }

    pub fn set_waveform(&mut self, waveform: OscillatorWaveform) {
        self.control.waveform = waveform;
        if let (Some(tone), Some(session)) = (self.tone.as_mut(), self.session.as_ref()) {
            tone.set_waveform(session, waveform);
            self.panel.show_status(&Status::Active(waveform));
        }
    }

    /// Page-ready: show the slider's starting level without making sound.
    pub fn ready(&mut self, slider: &str) {
        match parse_volume(slider) {
            Some(level) => {
                self.control.volume = level;
                self.panel.show_volume(&volume_label(level));
            }
            None => warn!("Ignoring initial slider value {:?}", slider),
        }
    }

    fn release_tone(&mut self) -> Result<()> {
        // Ownership goes even if scheduling the fade fails.
        let Some(tone) = self.tone.take() else {
            return Ok(());
        };
        if let Some(session) = self.session.as_ref() {
            match session.state() {
                SessionState::Running => {
                    tone.release(session, &self.fade)?;
                }
                // Nothing is audible and the clock is stopped, so a fade
                // would never finish.
                SessionState::Suspended => tone.discard(session),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::synth::{AudioGraph, AudioOutput, OfflineBackend, ParamEvent};
    use anyhow::bail;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct RecordingPanel {
        statuses: Vec<Status>,
        volumes: Vec<String>,
    }

    impl Panel for RecordingPanel {
        fn show_status(&mut self, status: &Status) {
            self.statuses.push(*status);
        }

        fn show_volume(&mut self, label: &str) {
            self.volumes.push(label.to_string());
        }
    }

    struct StuckOutput;

    impl AudioOutput for StuckOutput {
        fn resume(&mut self) -> Result<()> {
            bail!("device busy")
        }
    }

    /// Opens sessions whose device never starts.
    struct StuckBackend;

    impl AudioBackend for StuckBackend {
        fn open(&self) -> Result<AudioSession> {
            let graph = Arc::new(Mutex::new(AudioGraph::new(1000.0)));
            Ok(AudioSession::new(graph, Box::new(StuckOutput)))
        }
    }

    struct NoDevice;

    impl AudioBackend for NoDevice {
        fn open(&self) -> Result<AudioSession> {
            bail!("No output device available")
        }
    }

    fn controller() -> ToneController<OfflineBackend, RecordingPanel> {
        let settings = Config::default().tone;
        ToneController::new(
            OfflineBackend { sample_rate: 1000.0 },
            RecordingPanel::default(),
            &settings,
        )
    }

    fn render(controller: &ToneController<OfflineBackend, RecordingPanel>, frames: usize) -> Vec<f32> {
        let mut data = vec![0.0; frames];
        controller.session().unwrap().render(&mut data, 1);
        data
    }

    fn live_gain(controller: &ToneController<OfflineBackend, RecordingPanel>) -> f32 {
        let tone = controller.active_tone().unwrap();
        controller
            .session()
            .unwrap()
            .with_voice(tone.voice(), |voice, now| voice.gain().value_at(now))
            .unwrap()
    }

    fn live_waveform(
        controller: &ToneController<OfflineBackend, RecordingPanel>,
    ) -> OscillatorWaveform {
        let tone = controller.active_tone().unwrap();
        controller
            .session()
            .unwrap()
            .with_voice(tone.voice(), |voice, _| voice.oscillator().get_waveform())
            .unwrap()
    }

    #[test]
    fn starts_idle_without_a_session() {
        let controller = controller();
        assert_eq!(controller.state(), ToneState::Idle);
        assert!(controller.session().is_none());
        assert!(controller.active_tone().is_none());
    }

    #[test]
    fn activate_builds_tone_from_control_state() {
        let mut controller = controller();
        controller.set_waveform(OscillatorWaveform::Sawtooth);
        controller.set_volume(0.3);
        controller.activate().unwrap();

        assert_eq!(controller.state(), ToneState::Sounding);
        let tone = controller.active_tone().unwrap();
        assert_eq!(tone.waveform(), OscillatorWaveform::Sawtooth);
        assert_eq!(tone.volume(), 0.3);
        assert_eq!(live_waveform(&controller), OscillatorWaveform::Sawtooth);
        assert_eq!(live_gain(&controller), 0.3);

        let session = controller.session().unwrap();
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(
            controller.panel().statuses.last(),
            Some(&Status::Active(OscillatorWaveform::Sawtooth))
        );
    }

    #[test]
    fn activate_produces_sound_at_a440() {
        let mut controller = controller();
        controller.activate().unwrap();
        let tone = controller.active_tone().unwrap();
        let frequency = controller
            .session()
            .unwrap()
            .with_voice(tone.voice(), |voice, _| voice.oscillator().get_frequency())
            .unwrap();
        assert!((frequency - 440.0).abs() < 1e-3);

        let data = render(&controller, 100);
        assert!(data.iter().any(|s| s.abs() > 0.1));
        assert!(data.iter().all(|s| s.abs() <= 0.5 + 1e-6));
    }

    #[test]
    fn deactivate_schedules_fade_then_stop() {
        let mut controller = controller();
        controller.activate().unwrap();
        render(&controller, 100);
        let voice = controller.active_tone().unwrap().voice();

        controller.deactivate().unwrap();

        assert_eq!(controller.state(), ToneState::Idle);
        assert!(controller.active_tone().is_none());
        assert_eq!(controller.panel().statuses.last(), Some(&Status::Inactive));

        let session = controller.session().unwrap();
        session
            .with_voice(voice, |voice, now| {
                let stop_time = voice.oscillator().stop_time().unwrap();
                assert!((stop_time - (now + 0.05)).abs() < 1e-9);
                let ramp = voice
                    .gain()
                    .events()
                    .iter()
                    .find_map(|event| match *event {
                        ParamEvent::ExponentialRamp { value, end_time } => Some((value, end_time)),
                        _ => None,
                    })
                    .unwrap();
                assert_eq!(ramp, (0.001, stop_time));
            })
            .unwrap();

        // The fade plays out on the audio timeline, then the voice is gone.
        let tail = render(&controller, 100);
        assert_eq!(session.voice_count(), 0);
        assert!(tail[40..50].iter().all(|s| s.abs() < 0.01));
        assert!(tail[60..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn deactivate_while_idle_is_a_no_op() {
        let mut controller = controller();
        controller.deactivate().unwrap();
        assert_eq!(controller.state(), ToneState::Idle);
        assert!(controller.session().is_none());
        assert!(controller.panel().statuses.is_empty());

        controller.activate().unwrap();
        controller.deactivate().unwrap();
        controller.deactivate().unwrap();
        assert_eq!(controller.panel().statuses.len(), 2);
    }

    #[test]
    fn set_volume_while_sounding_applies_immediately() {
        let mut controller = controller();
        controller.activate().unwrap();
        render(&controller, 10);

        controller.set_volume(0.5);
        assert_eq!(controller.panel().volumes.last().map(String::as_str), Some("50%"));
        assert_eq!(live_gain(&controller), 0.5);

        controller.set_volume(0.8);
        assert_eq!(live_gain(&controller), 0.8);
        assert_eq!(controller.active_tone().unwrap().volume(), 0.8);
    }

    #[test]
    fn set_volume_while_idle_touches_only_control_state() {
        let mut controller = controller();
        controller.set_volume(0.5);
        assert_eq!(controller.control().volume, 0.5);
        assert_eq!(controller.panel().volumes, vec!["50%".to_string()]);
        assert!(controller.session().is_none());
        assert!(controller.active_tone().is_none());
    }

    #[test]
    fn set_waveform_while_sounding_does_not_retrigger() {
        let mut controller = controller();
        controller.activate().unwrap();
        render(&controller, 10);
        let voice = controller.active_tone().unwrap().voice();

        controller.set_waveform(OscillatorWaveform::Square);

        assert_eq!(controller.active_tone().unwrap().voice(), voice);
        assert_eq!(live_waveform(&controller), OscillatorWaveform::Square);
        let frequency = controller
            .session()
            .unwrap()
            .with_voice(voice, |voice, _| voice.oscillator().get_frequency())
            .unwrap();
        assert!((frequency - 440.0).abs() < 1e-3);
        let session = controller.session().unwrap();
        session
            .with_voice(voice, |voice, _| {
                assert_eq!(voice.oscillator().start_time(), Some(0.0));
                assert_eq!(voice.oscillator().stop_time(), None);
            })
            .unwrap();
        assert_eq!(session.voice_count(), 1);
        assert_eq!(
            controller.panel().statuses.last(),
            Some(&Status::Active(OscillatorWaveform::Square))
        );
    }

    #[test]
    fn set_waveform_while_idle_keeps_status() {
        let mut controller = controller();
        controller.set_waveform(OscillatorWaveform::Square);
        assert_eq!(controller.control().waveform, OscillatorWaveform::Square);
        assert!(controller.panel().statuses.is_empty());
        assert!(controller.active_tone().is_none());
    }

    #[test]
    fn control_state_survives_release_and_reactivation() {
        let mut controller = controller();
        controller.activate().unwrap();
        controller.set_volume(0.2);
        controller.set_waveform(OscillatorWaveform::Triangle);
        controller.deactivate().unwrap();
        controller.activate().unwrap();

        let tone = controller.active_tone().unwrap();
        assert_eq!(tone.waveform(), OscillatorWaveform::Triangle);
        assert_eq!(tone.volume(), 0.2);
        assert_eq!(live_waveform(&controller), OscillatorWaveform::Triangle);
        assert_eq!(live_gain(&controller), 0.2);
    }

    #[test]
    fn quick_reactivation_lets_old_fade_finish() {
        let mut controller = controller();
        controller.activate().unwrap();
        controller.deactivate().unwrap();
        controller.activate().unwrap();

        // Old voice still fading next to the new one.
        assert_eq!(controller.session().unwrap().voice_count(), 2);
        render(&controller, 100);
        assert_eq!(controller.session().unwrap().voice_count(), 1);
        assert_eq!(controller.state(), ToneState::Sounding);
    }

    #[test]
    fn reentrant_activate_releases_previous_tone() {
        let mut controller = controller();
        controller.activate().unwrap();
        let first = controller.active_tone().unwrap().voice();
        controller.activate().unwrap();
        let second = controller.active_tone().unwrap().voice();

        assert_ne!(first, second);
        let session = controller.session().unwrap();
        let first_stop = session
            .with_voice(first, |voice, _| voice.oscillator().stop_time())
            .unwrap();
        assert!(first_stop.is_some());
        render(&controller, 100);
        assert_eq!(controller.session().unwrap().voice_count(), 1);
    }

    #[test]
    fn suspended_session_does_not_accumulate_voices() {
        let settings = Config::default().tone;
        let mut controller = ToneController::new(StuckBackend, RecordingPanel::default(), &settings);
        for _ in 0..500 {
            controller.activate().unwrap();
            controller.set_volume(0.3);
            controller.deactivate().unwrap();
        }

        let session = controller.session().unwrap();
        assert_eq!(session.state(), SessionState::Suspended);
        assert_eq!(session.voice_count(), 0);
        assert_eq!(controller.state(), ToneState::Idle);
        assert_eq!(controller.panel().statuses.last(), Some(&Status::Inactive));
    }

    #[test]
    fn missing_device_fails_activation() {
        let settings = Config::default().tone;
        let mut controller = ToneController::new(NoDevice, RecordingPanel::default(), &settings);
        assert!(controller.activate().is_err());
        assert_eq!(controller.state(), ToneState::Idle);
        assert!(controller.panel().statuses.is_empty());
    }

    #[test]
    fn handles_ui_events() {
        let mut controller = controller();
        controller
            .handle(UiEvent::Ready {
                slider: "0.75".to_string(),
            })
            .unwrap();
        assert_eq!(controller.control().volume, 0.75);
        assert_eq!(controller.panel().volumes, vec!["75%".to_string()]);
        assert!(controller.session().is_none());

        controller.handle(UiEvent::Press).unwrap();
        assert_eq!(controller.state(), ToneState::Sounding);

        controller
            .handle(UiEvent::VolumeInput("garbage".to_string()))
            .unwrap();
        controller
            .handle(UiEvent::WaveformSelected("noise".to_string()))
            .unwrap();
        assert_eq!(controller.control().volume, 0.75);
        assert_eq!(controller.control().waveform, OscillatorWaveform::Sine);

        controller
            .handle(UiEvent::WaveformSelected("triangle".to_string()))
            .unwrap();
        controller
            .handle(UiEvent::VolumeInput("2.0".to_string()))
            .unwrap();
        assert_eq!(live_waveform(&controller), OscillatorWaveform::Triangle);
        assert_eq!(live_gain(&controller), 1.0);

        controller.handle(UiEvent::PointerLeave).unwrap();
        assert_eq!(controller.state(), ToneState::Idle);
        controller.handle(UiEvent::Release).unwrap();
        assert_eq!(controller.state(), ToneState::Idle);
    }
}
