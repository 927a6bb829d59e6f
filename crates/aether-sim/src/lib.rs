//! # Aether Sim
//!
//! Day/night and weather simulation for the Aether environment system.
//!
//! This crate provides:
//! - World clock with fixed-step time and weather accumulators
//! - Calendar events (hour, day, week) and scheduled callbacks
//! - Sun and moon placement from the time of day
//! - Weather presets, seasons and animated transitions
//! - Dynamic sky presenter behind a render command boundary
//! - Weather-aware footstep effects
//! - Environment facade and event bus

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod calendar;
pub mod clock;
pub mod delegate;
pub mod dynamic_sky;
pub mod effects;
pub mod environment;
pub mod events;
pub mod footsteps;
pub mod params;
pub mod preset;
pub mod renderer;
pub mod schedule;
pub mod season;
pub mod sky;
pub mod time;
pub mod transition;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::calendar::*;
    pub use crate::clock::*;
    pub use crate::delegate::*;
    pub use crate::dynamic_sky::*;
    pub use crate::effects::*;
    pub use crate::environment::*;
    pub use crate::events::*;
    pub use crate::footsteps::*;
    pub use crate::params::*;
    pub use crate::preset::*;
    pub use crate::renderer::*;
    pub use crate::schedule::*;
    pub use crate::season::*;
    pub use crate::sky::*;
    pub use crate::time::*;
    pub use crate::transition::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_drives_sky_through_a_day() {
        let settings =
            ClockSettings::new(TickRate::from_seconds(3600).expect("tick"), 1.0, 10.0).expect("clock");
        let sky = DynamicSky::new(
            SkySettings::default(),
            RecordingRenderer::new(),
            ParameterCollection::weather().into_shared(),
        )
        .expect("sky");
        let mut env = Environment::new(WorldClock::new(settings), sky, PresetLibrary::new());
        env.initialize();

        let mut daytime_hours = 0;
        for _ in 0..24 {
            env.update(1.0).expect("update");
            if env.sky().lock().is_daytime() {
                daytime_hours += 1;
            }
        }
        // Hours strictly between 4.8 and 19.2
        assert_eq!(daytime_hours, 15);
        assert_eq!(env.clock().date_time().hour(), 12);
    }
}
