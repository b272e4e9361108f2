//! Automatable audio parameters
//!
//! An `AudioParam` is a value that can be scheduled to change over time:
//! jumps, linear ramps and exponential ramps. Gains and oscillator
//! frequencies are all `AudioParam`s, which is what lets a tone burst
//! describe its whole envelope up front and then run unattended.

use crate::error::{NebulaError, Result};

// ============================================================================
// Automation Events
// ============================================================================

/// One scheduled change of a parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    /// Jump to `value` at `time`
    SetValue { value: f32, time: f64 },
    /// Reach `value` at `end_time`, moving linearly from the previous event
    LinearRamp { value: f32, end_time: f64 },
    /// Reach `value` at `end_time`, moving geometrically from the previous event
    ExponentialRamp { value: f32, end_time: f64 },
}

impl ParamEvent {
    /// Time at which the event's target value is reached
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. } => time,
            ParamEvent::LinearRamp { end_time, .. } => end_time,
            ParamEvent::ExponentialRamp { end_time, .. } => end_time,
        }
    }

    fn value(&self) -> f32 {
        match *self {
            ParamEvent::SetValue { value, .. } => value,
            ParamEvent::LinearRamp { value, .. } => value,
            ParamEvent::ExponentialRamp { value, .. } => value,
        }
    }
}

// ============================================================================
// AudioParam
// ============================================================================

/// A parameter with a default value and a time-ordered automation list
#[derive(Debug, Clone, PartialEq)]
pub struct AudioParam {
    default_value: f32,
    events: Vec<ParamEvent>,
}

impl AudioParam {
    /// Create a parameter that holds `value` until automated
    pub fn new(value: f32) -> Self {
        Self {
            default_value: value,
            events: Vec::new(),
        }
    }

    /// Set the value immediately, discarding any scheduled automation
    pub fn set_value(&mut self, value: f32) {
        self.events.clear();
        self.default_value = value;
    }

    /// Schedule a jump to `value` at `time`
    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(ParamEvent::SetValue { value, time });
        self
    }

    /// Schedule a linear ramp ending at `end_time`
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) -> &mut Self {
        self.insert(ParamEvent::LinearRamp { value, end_time });
        self
    }

    /// Schedule an exponential ramp ending at `end_time`
    ///
    /// Geometric interpolation is undefined through zero, so the target must
    /// be strictly positive.
    pub fn exponential_ramp_to_value_at_time(
        &mut self,
        value: f32,
        end_time: f64,
    ) -> Result<&mut Self> {
        if !(value > 0.0) || !value.is_finite() {
            return Err(NebulaError::InvalidParameter {
                param: "exponential_ramp_target".to_string(),
                value: value as f64,
                min: f32::MIN_POSITIVE as f64,
                max: f32::MAX as f64,
            });
        }
        self.insert(ParamEvent::ExponentialRamp { value, end_time });
        Ok(self)
    }

    /// Remove every event scheduled at or after `time`
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Move to `value`, starting from the current value at `now`
    ///
    /// A zero `ramp_secs` is an immediate change.
    pub fn ramp_to(&mut self, value: f32, now: f64, ramp_secs: f64) {
        if ramp_secs <= 0.0 {
            self.set_value(value);
            return;
        }
        let current = self.value_at(now);
        self.events.clear();
        self.default_value = current;
        self.insert(ParamEvent::SetValue {
            value: current,
            time: now,
        });
        self.insert(ParamEvent::LinearRamp {
            value,
            end_time: now + ramp_secs,
        });
    }

    /// Scheduled events, ordered by the time they complete
    pub fn events(&self) -> &[ParamEvent] {
        &self.events
    }

    /// Evaluate the parameter at `time` (seconds)
    pub fn value_at(&self, time: f64) -> f32 {
        let mut prev_value = self.default_value;
        let mut prev_time = 0.0_f64;

        for event in &self.events {
            match *event {
                ParamEvent::SetValue { value, time: at } => {
                    if at > time {
                        return prev_value;
                    }
                    prev_value = value;
                    prev_time = at;
                }
                ParamEvent::LinearRamp { value, end_time } => {
                    if end_time > time {
                        let frac = ramp_fraction(prev_time, end_time, time);
                        return prev_value + (value - prev_value) * frac as f32;
                    }
                    prev_value = value;
                    prev_time = end_time;
                }
                ParamEvent::ExponentialRamp { value, end_time } => {
                    if end_time > time {
                        // Same-sign, non-zero endpoints only; otherwise hold
                        if prev_value == 0.0 || (prev_value < 0.0) != (value < 0.0) {
                            return prev_value;
                        }
                        let frac = ramp_fraction(prev_time, end_time, time);
                        let ratio = (value / prev_value) as f64;
                        return (prev_value as f64 * ratio.powf(frac)) as f32;
                    }
                    prev_value = value;
                    prev_time = end_time;
                }
            }
        }

        prev_value
    }

    fn insert(&mut self, event: ParamEvent) {
        // Stable: events at the same time keep insertion order
        let at = event.time();
        let index = self.events.partition_point(|e| e.time() <= at);
        self.events.insert(index, event);
    }

    /// Value the parameter settles at once all automation has run
    pub fn final_value(&self) -> f32 {
        self.events
            .last()
            .map(ParamEvent::value)
            .unwrap_or(self.default_value)
    }
}

impl Default for AudioParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[inline]
fn ramp_fraction(start: f64, end: f64, time: f64) -> f64 {
    let span = end - start;
    if span <= 0.0 {
        return 1.0;
    }
    ((time - start) / span).clamp(0.0, 1.0)
}

// ============================================================================
// Tests
// ============================================================================
