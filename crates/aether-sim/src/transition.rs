//! Timed weather transitions.
//!
//! A transition ramps one ground parameter from 0 to 1 over real time. Which
//! parameter moves is decided by the preset's weather type when the
//! transition starts: snow strength for snowy presets, puddles for rainy
//! ones, nothing otherwise. Starting a new transition replaces the old one
//! outright, so a superseded preset never writes again.

use std::sync::Arc;

use aether_common::{ConfigError, EnvironmentError, EnvironmentResult, ListenerId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::delegate::Listeners;
use crate::params::WeatherParameter;
use crate::preset::{WeatherPreset, WeatherType};

/// Default play rate: one full transition every ten seconds.
pub const DEFAULT_PLAY_RATE: f32 = 0.1;

/// Shape of a transition over its normalized position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum TransitionCurve {
    /// Value equals position.
    #[default]
    Linear,
    /// Hermite ease in and out.
    SmoothStep,
    /// Piecewise-linear through `(position, value)` keys sorted by position.
    Keys(Vec<(f32, f32)>),
}

impl TransitionCurve {
    /// Evaluates the curve at `t` in [0, 1].
    #[must_use]
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
            Self::Keys(keys) => evaluate_keys(keys, t),
        }
    }

    /// Checks that keys are finite and sorted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Self::Keys(keys) = self else {
            return Ok(());
        };
        if keys.is_empty() {
            return Err(ConfigError::Parse("transition curve needs at least one key".to_string()));
        }
        let sorted = keys.windows(2).all(|pair| pair[0].0 <= pair[1].0);
        let finite = keys.iter().all(|(t, v)| t.is_finite() && v.is_finite());
        if sorted && finite {
            Ok(())
        } else {
            Err(ConfigError::Parse(
                "transition curve keys must be finite and sorted by position".to_string(),
            ))
        }
    }
}

fn evaluate_keys(keys: &[(f32, f32)], t: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return t;
    };
    if t <= first.0 {
        return first.1;
    }
    if t >= last.0 {
        return last.1;
    }
    for pair in keys.windows(2) {
        let ((t0, v0), (t1, v1)) = (pair[0], pair[1]);
        if t <= t1 {
            let span = t1 - t0;
            if span <= f32::EPSILON {
                return v1;
            }
            return v0 + (v1 - v0) * (t - t0) / span;
        }
    }
    last.1
}

/// Parameter a weather type animates, if any.
#[must_use]
pub fn animated_parameter(weather_type: WeatherType) -> Option<WeatherParameter> {
    match weather_type {
        WeatherType::Snowy => Some(WeatherParameter::SnowStrength),
        WeatherType::Rainy => Some(WeatherParameter::ShowPuddles),
        WeatherType::Sunny => None,
    }
}

/// Controller state.
#[derive(Debug, Clone, Default)]
pub enum TransitionState {
    /// No transition has run since the last immediate apply.
    #[default]
    Idle,
    /// A transition is running or has finished and is pinned at 1.
    Transitioning {
        /// Target preset.
        preset: Arc<WeatherPreset>,
        /// Normalized position, [0, 1].
        progress: f32,
    },
}

/// One sampled transition step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionStep {
    /// Normalized position after this step.
    pub progress: f32,
    /// Curve value at `progress`.
    pub value: f32,
    /// Parameter to write `value` to, if the weather type animates one.
    pub target: Option<WeatherParameter>,
}

/// Drives a single weather transition at a time.
#[derive(Debug)]
pub struct WeatherTransitionController {
    state: TransitionState,
    target: Option<WeatherParameter>,
    play_rate: f32,
    curve: TransitionCurve,
    on_update: Listeners<TransitionStep>,
}

impl Default for WeatherTransitionController {
    fn default() -> Self {
        Self {
            state: TransitionState::Idle,
            target: None,
            play_rate: DEFAULT_PLAY_RATE,
            curve: TransitionCurve::Linear,
            on_update: Listeners::new(),
        }
    }
}

impl WeatherTransitionController {
    /// Creates a controller. `play_rate` is transitions per real second.
    pub fn new(play_rate: f32, curve: TransitionCurve) -> Result<Self, ConfigError> {
        if !play_rate.is_finite() || play_rate <= 0.0 {
            return Err(ConfigError::NonPositiveFrequency {
                name: "transition_play_rate",
                value: play_rate,
            });
        }
        curve.validate()?;
        Ok(Self {
            play_rate,
            curve,
            ..Default::default()
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    /// Current progress, or `None` when idle.
    #[must_use]
    pub fn progress(&self) -> Option<f32> {
        match &self.state {
            TransitionState::Idle => None,
            TransitionState::Transitioning { progress, .. } => Some(*progress),
        }
    }

    /// Whether a transition is still advancing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.progress().is_some_and(|progress| progress < 1.0)
    }

    /// Transitions per real second.
    #[must_use]
    pub fn play_rate(&self) -> f32 {
        self.play_rate
    }

    /// Curve applied to the position.
    #[must_use]
    pub fn curve(&self) -> &TransitionCurve {
        &self.curve
    }

    /// Subscribes to sampled steps.
    pub fn on_update(&mut self, listener: impl FnMut(&TransitionStep) + 'static) -> ListenerId {
        self.on_update.subscribe(listener)
    }

    /// Removes a step listener.
    pub fn remove_on_update(&mut self, id: ListenerId) -> bool {
        self.on_update.unsubscribe(id)
    }

    /// Starts a transition to `preset`, replacing any in flight.
    pub fn start(&mut self, preset: Arc<WeatherPreset>) {
        if let TransitionState::Transitioning { preset: previous, progress } = &self.state {
            if *progress < 1.0 {
                debug!(
                    "Superseding transition to '{}' at {:.2}",
                    previous.name, progress
                );
            }
        }
        self.target = animated_parameter(preset.weather_type);
        info!(
            "Starting weather transition to '{}' ({})",
            preset.name,
            preset.weather_type.display_name()
        );
        self.state = TransitionState::Transitioning {
            preset,
            progress: 0.0,
        };
    }

    /// Drops any transition and returns to idle.
    pub fn reset(&mut self) {
        self.state = TransitionState::Idle;
        self.target = None;
    }

    /// Advances the running transition by `delta_real_seconds`.
    ///
    /// Returns the step taken, or `None` when idle or already pinned at 1.
    pub fn sample(&mut self, delta_real_seconds: f32) -> EnvironmentResult<Option<TransitionStep>> {
        if !delta_real_seconds.is_finite() || delta_real_seconds < 0.0 {
            return Err(EnvironmentError::InvalidArgument(format!(
                "transition delta must be a non-negative number of seconds, got {delta_real_seconds}"
            )));
        }

        let TransitionState::Transitioning { progress, .. } = &mut self.state else {
            return Ok(None);
        };
        if *progress >= 1.0 {
            return Ok(None);
        }

        *progress = (*progress + self.play_rate * delta_real_seconds).min(1.0);
        let step = TransitionStep {
            progress: *progress,
            value: self.curve.evaluate(*progress),
            target: self.target,
        };
        if step.progress >= 1.0 {
            debug!("Weather transition finished");
        }

        self.on_update.broadcast(&step);
        Ok(Some(step))
    }
}
