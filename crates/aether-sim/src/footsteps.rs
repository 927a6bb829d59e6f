//! Footstep effects driven by the weather parameters.
//!
//! When a foot lands, snow strength and puddle level are read from the shared
//! parameter collection. Above the threshold, the ground under the foot is
//! traced; on landscape, snow leaves a footprint decal and rain splashes on
//! the configured puddle material.

use aether_common::{EffectHandle, PhysicalMaterialId};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use crate::params::{SharedParameters, WeatherParameter};

/// Default strength above which footsteps react to the weather.
pub const DEFAULT_FOOTSTEP_THRESHOLD: f32 = 0.5;

/// Which foot landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Foot {
    /// Left foot.
    Left,
    /// Right foot.
    Right,
}

/// Result of tracing the ground under a foot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    /// Impact point.
    pub location: Vec3,
    /// Whether the hit object is landscape.
    pub is_landscape: bool,
    /// Surface material at the impact point.
    pub physical_material: Option<PhysicalMaterialId>,
}

/// Spawns one-shot particle effects in the world.
pub trait EffectSpawner {
    /// Spawns `effect` at `location` facing `rotation`.
    fn spawn_at(&mut self, effect: &EffectHandle, location: Vec3, rotation: Quat);
}

/// Footstep effect configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootstepSettings {
    /// Snow strength or puddle level needed to react, [0, 1].
    pub threshold: f32,
    /// Footprint decal for the left foot.
    pub left_foot_decal: Option<EffectHandle>,
    /// Footprint decal for the right foot.
    pub right_foot_decal: Option<EffectHandle>,
    /// Splash spawned when stepping in a puddle.
    pub rain_splash: Option<EffectHandle>,
    /// Surface material that counts as a puddle.
    pub rain_splash_material: Option<PhysicalMaterialId>,
}

impl Default for FootstepSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FOOTSTEP_THRESHOLD,
            left_foot_decal: None,
            right_foot_decal: None,
            rain_splash: None,
            rain_splash_material: None,
        }
    }
}

/// Snow and rain state as seen by footsteps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundConditions {
    /// Snow strength at or above the threshold.
    pub is_snowing: bool,
    /// Puddle level at or above the threshold.
    pub is_raining: bool,
}

/// What a landed foot did.
#[derive(Debug, Clone, PartialEq)]
pub enum FootstepOutcome {
    /// The weather parameters could not be read.
    MissingParameters,
    /// Neither snowy nor rainy enough.
    Dry,
    /// The trace hit nothing, or something other than landscape.
    NotLandscape,
    /// A snow footprint was spawned.
    SnowDecal(EffectHandle),
    /// A rain splash was spawned.
    RainSplash(EffectHandle),
    /// Conditions matched but no effect is configured for this surface.
    NoEffect,
}

/// Reacts to landed feet with weather effects.
#[derive(Debug, Clone)]
pub struct FootstepEffects {
    settings: FootstepSettings,
    parameters: SharedParameters,
}

impl FootstepEffects {
    /// Creates footstep effects reading `parameters`. The threshold is
    /// clamped to [0, 1].
    #[must_use]
    pub fn new(mut settings: FootstepSettings, parameters: SharedParameters) -> Self {
        settings.threshold = settings.threshold.clamp(0.0, 1.0);
        Self {
            settings,
            parameters,
        }
    }

    /// Settings in effect.
    #[must_use]
    pub fn settings(&self) -> &FootstepSettings {
        &self.settings
    }

    /// Reads the current ground conditions.
    ///
    /// Returns `None` and logs if either parameter is missing.
    #[must_use]
    pub fn conditions(&self) -> Option<GroundConditions> {
        let parameters = self.parameters.read();
        let Some(snow) = parameters.get(WeatherParameter::SnowStrength) else {
            error!("Could not fetch value of SnowStrength");
            return None;
        };
        let Some(puddles) = parameters.get(WeatherParameter::ShowPuddles) else {
            error!("Could not fetch value of ShowPuddles");
            return None;
        };
        Some(GroundConditions {
            is_snowing: snow >= self.settings.threshold,
            is_raining: puddles >= self.settings.threshold,
        })
    }

    /// Handles a landed foot.
    ///
    /// `trace_ground` is only called when the weather warrants an effect. Snow wins
    /// over rain when both are above the threshold.
    pub fn on_foot_landed<S: EffectSpawner + ?Sized>(
        &self,
        foot: Foot,
        rotation: Quat,
        trace_ground: impl FnOnce(Foot) -> Option<GroundHit>,
        spawner: &mut S,
    ) -> FootstepOutcome {
        let Some(conditions) = self.conditions() else {
            return FootstepOutcome::MissingParameters;
        };
        if !conditions.is_snowing && !conditions.is_raining {
            return FootstepOutcome::Dry;
        }

        let Some(hit) = trace_ground(foot).filter(|hit| hit.is_landscape) else {
            return FootstepOutcome::NotLandscape;
        };

        if conditions.is_snowing {
            let decal = match foot {
                Foot::Left => self.settings.left_foot_decal.as_ref(),
                Foot::Right => self.settings.right_foot_decal.as_ref(),
            };
            return match decal {
                Some(effect) => {
                    trace!("Snow footprint ({foot:?}) at {}", hit.location);
                    spawner.spawn_at(effect, hit.location, rotation);
                    FootstepOutcome::SnowDecal(effect.clone())
                },
                None => FootstepOutcome::NoEffect,
            };
        }

        let on_puddle = self
            .settings
            .rain_splash_material
            .is_some_and(|material| hit.physical_material == Some(material));
        match (&self.settings.rain_splash, on_puddle) {
            (Some(effect), true) => {
                trace!("Rain splash at {}", hit.location);
                spawner.spawn_at(effect, hit.location, rotation);
                FootstepOutcome::RainSplash(effect.clone())
            },
            _ => FootstepOutcome::NoEffect,
        }
    }
}
