//! Time-scheduled parameter automation.
//!
//! A parameter holds a list of events ordered by time. Its value at any
//! instant is found by walking that list: a step holds its value until the
//! next event, and an exponential ramp interpolates multiplicatively from the
//! previous event's value and time to its own target at its end time.

use anyhow::{ensure, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    SetValue { value: f32, time: f64 },
    ExponentialRamp { value: f32, end_time: f64 },
}

impl ParamEvent {
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. } => time,
            ParamEvent::ExponentialRamp { end_time, .. } => end_time,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            ParamEvent::SetValue { value, .. } | ParamEvent::ExponentialRamp { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioParam {
    default_value: f32,
    events: Vec<ParamEvent>,
}

impl AudioParam {
    pub fn new(default_value: f32) -> Self {
        AudioParam {
            default_value,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[ParamEvent] {
        &self.events
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(ParamEvent::SetValue { value, time });
    }

    /// Schedules a multiplicative ramp ending at `end_time`. Exact zero is
    /// unreachable this way, so the target must be strictly positive.
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) -> Result<()> {
        ensure!(
            value > 0.0 && value.is_finite(),
            "exponential ramp target must be positive, got {value}"
        );
        self.insert(ParamEvent::ExponentialRamp { value, end_time });
        Ok(())
    }

    pub fn value_at(&self, time: f64) -> f32 {
        let mut value = self.default_value;
        let mut from_time = 0.0;

        for event in &self.events {
            match *event {
                ParamEvent::SetValue { value: v, time: t } => {
                    if t > time {
                        break;
                    }
                    value = v;
                    from_time = t;
                }
                ParamEvent::ExponentialRamp { value: target, end_time } => {
                    if end_time <= time {
                        value = target;
                        from_time = end_time;
                        continue;
                    }
                    // Ramp in progress. Zero or a sign change cannot be
                    // interpolated multiplicatively, so the old value holds.
                    if value == 0.0 || value.signum() != target.signum() {
                        return value;
                    }
                    let progress = ((time - from_time) / (end_time - from_time)) as f32;
                    return value * (target / value).powf(progress);
                }
            }
        }

        value
    }

    /// Collapses events that completed at or before `now` into a single
    /// step, keeping the schedule short for long-held notes.
    pub fn compact(&mut self, now: f64) {
        let done = self.events.iter().take_while(|e| e.time() <= now).count();
        if done > 1 {
            let last = self.events[done - 1];
            self.events.drain(..done);
            self.events.insert(
                0,
                ParamEvent::SetValue {
                    value: last.value(),
                    time: last.time(),
                },
            );
        }
    }

    fn insert(&mut self, event: ParamEvent) {
        let index = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(index, event);
    }
}
