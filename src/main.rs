// holdtone/src/main.rs

use std::path::Path;

use anyhow::Result;
use holdtone::{
    config::{Config, DEFAULT_CONFIG_PATH},
    synth::CpalBackend,
    ui::{key_name, volume_label, Panel, Status, WindowInput},
    ToneController,
};
use tracing::{debug, error, info, warn, Level};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent},
    event_loop::EventLoop,
    window::{Window, WindowBuilder},
};

/// Shows the controller's output in the window title.
struct TitlePanel<'a> {
    window: &'a Window,
    status: Status,
    volume: String,
}

impl<'a> TitlePanel<'a> {
    fn new(window: &'a Window, volume: f32) -> Self {
        let panel = TitlePanel {
            window,
            status: Status::Inactive,
            volume: volume_label(volume),
        };
        panel.refresh();
        panel
    }

    fn refresh(&self) {
        self.window
            .set_title(&format!("holdtone: {} | volume {}", self.status, self.volume));
    }
}

impl Panel for TitlePanel<'_> {
    fn show_status(&mut self, status: &Status) {
        info!("Status: {}", status);
        self.status = *status;
        self.refresh();
    }

    fn show_volume(&mut self, label: &str) {
        debug!("Volume: {}", label);
        self.volume = label.to_string();
        self.refresh();
    }
}

fn load_config() -> Result<Config> {
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        Config::load(DEFAULT_CONFIG_PATH)
    } else {
        warn!("No configuration at '{}', using defaults", DEFAULT_CONFIG_PATH);
        Ok(Config::default())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = load_config()?;

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("holdtone")
        .with_inner_size(LogicalSize::new(360.0, 160.0))
        .build(&event_loop)?;

    let mut input = WindowInput::new(&config.tone, &config.keybindings);
    let panel = TitlePanel::new(&window, config.tone.initial_volume);
    let mut controller = ToneController::new(CpalBackend, panel, &config.tone);
    controller.handle(input.ready())?;

    // Hold the left mouse button (or the press key) in the window to play.
    debug!("Starting event loop");
    event_loop.run(move |event, event_loop_window_target| {
        let Event::WindowEvent { event, .. } = event else {
            return;
        };

        let ui_event = match event {
            WindowEvent::CloseRequested => {
                debug!("The close button was pressed; stopping");
                event_loop_window_target.exit();
                None
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => Some(input.on_button(state == ElementState::Pressed)),
            WindowEvent::CursorLeft { .. } => Some(input.on_pointer_leave()),
            WindowEvent::Focused(focused) => input.on_focus_changed(focused),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state,
                        repeat,
                        ..
                    },
                is_synthetic,
                ..
            } => {
                if repeat || is_synthetic {
                    None
                } else {
                    key_name(&logical_key)
                        .and_then(|key| input.on_key(&key, state == ElementState::Pressed))
                }
            }
            _ => None,
        };

        if let Some(ui_event) = ui_event {
            // Only the platform side can fail here, and there is no recovering from it.
            if let Err(e) = controller.handle(ui_event) {
                error!("Audio failure: {:#}", e);
                std::process::exit(1);
            }
        }
    })?;

    Ok(())
}
