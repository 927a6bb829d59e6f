//! Sun and moon placement as a pure function of the time of day.
//!
//! The sun sweeps linearly from `SUN_RISE` at dawn to `SUN_SET` at dusk. The
//! moon has two arcs: after the true dusk it climbs from `MOON_RISE` to
//! `MOON_MIDNIGHT` at 24:00, and before the true dawn it sinks from
//! `MOON_MIDNIGHT` at 00:00 to `MOON_SET`. Between the two it keeps its last
//! angle, since it is hidden.

use serde::{Deserialize, Serialize};

use aether_common::ConfigError;

use crate::time::HOURS_PER_DAY;

/// Sun pitch at dawn, in degrees.
pub const SUN_RISE: f32 = 0.0;
/// Sun pitch at solar noon, in degrees.
pub const SUN_NOON: f32 = -90.0;
/// Sun pitch at dusk, in degrees.
pub const SUN_SET: f32 = -180.0;

/// Moon pitch when it rises after dusk, in degrees.
pub const MOON_RISE: f32 = -180.0;
/// Moon pitch at midnight, in degrees.
pub const MOON_MIDNIGHT: f32 = -90.0;
/// Moon pitch when it sets before dawn, in degrees.
pub const MOON_SET: f32 = 0.0;

/// Which directional light a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CelestialBody {
    /// The sun.
    Sun,
    /// The moon.
    Moon,
}

/// Derived sun/moon placement for one time of day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyAngles {
    /// Sun pitch in degrees.
    pub sun_angle: f32,
    /// Moon pitch in degrees.
    pub moon_angle: f32,
    /// Whether the time lies strictly between true dawn and true dusk.
    pub is_daytime: bool,
}

impl Default for SkyAngles {
    fn default() -> Self {
        Self {
            sun_angle: SUN_RISE,
            moon_angle: MOON_MIDNIGHT,
            is_daytime: false,
        }
    }
}

impl SkyAngles {
    /// Whether a body's light should be visible.
    #[must_use]
    pub fn is_visible(&self, body: CelestialBody) -> bool {
        match body {
            CelestialBody::Sun => self.is_daytime,
            CelestialBody::Moon => !self.is_daytime,
        }
    }

    /// Pitch of a body in degrees.
    #[must_use]
    pub fn angle(&self, body: CelestialBody) -> f32 {
        match body {
            CelestialBody::Sun => self.sun_angle,
            CelestialBody::Moon => self.moon_angle,
        }
    }
}

/// Dawn/dusk configuration for the sky.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyPositionModel {
    /// Hour the sun rises.
    pub dawn_time: f32,
    /// Hours before `dawn_time` that already count as day.
    pub dawn_offset: f32,
    /// Hour the sun sets.
    pub dusk_time: f32,
    /// Hours after `dusk_time` that still count as day.
    pub dusk_offset: f32,
    /// Yaw applied to both lights, in degrees.
    pub yaw: f32,
}

impl Default for SkyPositionModel {
    fn default() -> Self {
        Self {
            dawn_time: 5.0,
            dawn_offset: 0.2,
            dusk_time: 19.0,
            dusk_offset: 0.2,
            yaw: 0.0,
        }
    }
}

impl SkyPositionModel {
    /// Checks hour ranges and ordering.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("dawn_time", self.dawn_time, 0.0, HOURS_PER_DAY)?;
        check_range("dusk_time", self.dusk_time, 0.0, HOURS_PER_DAY)?;
        check_range("sun_moon_yaw", self.yaw, 0.0, 360.0)?;
        if self.dawn_time >= self.dusk_time {
            return Err(ConfigError::DawnAfterDusk {
                dawn: self.dawn_time,
                dusk: self.dusk_time,
            });
        }
        Ok(())
    }

    /// Dawn minus its offset.
    #[must_use]
    pub fn true_dawn(&self) -> f32 {
        self.dawn_time - self.dawn_offset
    }

    /// Dusk plus its offset.
    #[must_use]
    pub fn true_dusk(&self) -> f32 {
        self.dusk_time + self.dusk_offset
    }

    /// Strictly between true dawn and true dusk; the boundaries count as night.
    #[must_use]
    pub fn is_daytime(&self, time_of_day: f32) -> bool {
        time_of_day > self.true_dawn() && time_of_day < self.true_dusk()
    }

    /// Sun pitch, linear between dawn and dusk and extrapolated outside.
    #[must_use]
    pub fn sun_angle(&self, time_of_day: f32) -> f32 {
        map_range_unclamped(time_of_day, self.dawn_time, self.dusk_time, SUN_RISE, SUN_SET)
    }

    /// Moon pitch, or `None` while the moon keeps its previous angle.
    #[must_use]
    pub fn moon_angle(&self, time_of_day: f32) -> Option<f32> {
        let true_dusk = self.true_dusk();
        let true_dawn = self.true_dawn();

        if time_of_day > true_dusk {
            Some(map_range_unclamped(
                time_of_day,
                true_dusk,
                HOURS_PER_DAY,
                MOON_RISE,
                MOON_MIDNIGHT,
            ))
        } else if time_of_day < true_dawn {
            Some(map_range_unclamped(
                time_of_day,
                0.0,
                true_dawn,
                MOON_MIDNIGHT,
                MOON_SET,
            ))
        } else {
            None
        }
    }

    /// Full placement for `time_of_day`, reusing `previous_moon` when the moon
    /// has no arc at this hour.
    #[must_use]
    pub fn angles(&self, time_of_day: f32, previous_moon: f32) -> SkyAngles {
        SkyAngles {
            sun_angle: self.sun_angle(time_of_day),
            moon_angle: self.moon_angle(time_of_day).unwrap_or(previous_moon),
            is_daytime: self.is_daytime(time_of_day),
        }
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

/// Linearly remaps `value` from [in_a, in_b] to [out_a, out_b] without clamping.
///
/// A degenerate input range yields `out_b` at or past `in_b`, `out_a` otherwise.
#[must_use]
pub fn map_range_unclamped(value: f32, in_a: f32, in_b: f32, out_a: f32, out_b: f32) -> f32 {
    let span = in_b - in_a;
    let t = if span.abs() <= f32::EPSILON {
        if value >= in_b {
            1.0
        } else {
            0.0
        }
    } else {
        (value - in_a) / span
    };
    out_a + (out_b - out_a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_true_dawn_and_dusk() {
        let model = SkyPositionModel::default();
        assert!((model.true_dawn() - 4.8).abs() < EPS);
        assert!((model.true_dusk() - 19.2).abs() < EPS);
    }

    #[test]
    fn test_daytime_boundaries_are_strict() {
        let model = SkyPositionModel::default();
        assert!(model.is_daytime(5.0));
        assert!(!model.is_daytime(model.true_dawn()));
        assert!(!model.is_daytime(model.true_dusk()));
        assert!(model.is_daytime(12.0));
        assert!(!model.is_daytime(23.0));
    }

    #[test]
    fn test_sun_angle_endpoints_and_midpoint() {
        let model = SkyPositionModel::default();
        assert!((model.sun_angle(5.0) - SUN_RISE).abs() < EPS);
        assert!((model.sun_angle(19.0) - SUN_SET).abs() < EPS);
        assert!((model.sun_angle(12.0) - SUN_NOON).abs() < EPS);
        // Extrapolates outside [dawn, dusk]
        assert!(model.sun_angle(4.0) > SUN_RISE);
        assert!(model.sun_angle(20.0) < SUN_SET);
    }

    #[test]
    fn test_moon_after_dusk() {
        let model = SkyPositionModel::default();
        let just_after = model.moon_angle(model.true_dusk() + 0.001).expect("night arc");
        assert!((just_after - MOON_RISE).abs() < 0.1);
        let late = model.moon_angle(23.999).expect("night arc");
        assert!((late - MOON_MIDNIGHT).abs() < 0.1);
    }

    #[test]
    fn test_moon_before_dawn() {
        let model = SkyPositionModel::default();
        let midnight = model.moon_angle(0.0).expect("night arc");
        assert!((midnight - MOON_MIDNIGHT).abs() < EPS);
        let half = model.moon_angle(2.4).expect("night arc");
        assert!((half - (-45.0)).abs() < EPS);
    }

    #[test]
    fn test_moon_keeps_angle_during_day() {
        let model = SkyPositionModel::default();
        assert!(model.moon_angle(12.0).is_none());
        // Exactly at true dusk neither arc applies
        assert!(model.moon_angle(model.true_dusk()).is_none());

        let angles = model.angles(12.0, -33.0);
        assert!((angles.moon_angle - (-33.0)).abs() < EPS);
        assert!(angles.is_daytime);
        assert!(angles.is_visible(CelestialBody::Sun));
        assert!(!angles.is_visible(CelestialBody::Moon));
    }

    #[test]
    fn test_visibility_at_night() {
        let model = SkyPositionModel::default();
        let angles = model.angles(2.0, 0.0);
        assert!(!angles.is_daytime);
        assert!(!angles.is_visible(CelestialBody::Sun));
        assert!(angles.is_visible(CelestialBody::Moon));
    }

    #[test]
    fn test_validate() {
        assert!(SkyPositionModel::default().validate().is_ok());
        let inverted = SkyPositionModel {
            dawn_time: 20.0,
            dusk_time: 6.0,
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::DawnAfterDusk { .. })
        ));
        let out_of_range = SkyPositionModel {
            dusk_time: 25.0,
            ..Default::default()
        };
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn test_map_range_degenerate() {
        assert!((map_range_unclamped(3.0, 2.0, 2.0, 0.0, 10.0) - 10.0).abs() < EPS);
        assert!((map_range_unclamped(1.0, 2.0, 2.0, 0.0, 10.0)).abs() < EPS);
    }
}
