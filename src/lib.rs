pub mod config;
pub mod controller;
pub mod synth;
pub mod ui;

pub use controller::{ToneController, ToneState};
