//! Environment facade: the clock, the sky and the preset library wired
//! together.
//!
//! The embedding application calls `initialize` once, `update` every frame
//! with the real frame delta, and `shutdown` before dropping the environment.

use std::sync::Arc;

use aether_common::{CallbackId, EnvironmentError, EnvironmentResult};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::calendar::CalendarNotice;
use crate::clock::{ClockTick, SharedPresenter, WorldClock};
use crate::dynamic_sky::DynamicSky;
use crate::events::{EnvironmentEvent, EventBus};
use crate::footsteps::{FootstepEffects, FootstepSettings};
use crate::params::SharedParameters;
use crate::preset::{PresetLibrary, WeatherPreset};
use crate::renderer::SkyRenderer;
use crate::schedule::ScheduledEvent;
use crate::season::{SeasonCycle, WeatherInfo};
use crate::time::WorldDateTime;

/// Owns the world clock and the dynamic sky it drives.
pub struct Environment<R: SkyRenderer + 'static> {
    clock: WorldClock,
    sky: Arc<Mutex<DynamicSky<R>>>,
    presenter: SharedPresenter,
    presets: PresetLibrary,
    seasons: SeasonCycle,
    parameters: SharedParameters,
    events: EventBus,
    initialized: bool,
}

impl<R: SkyRenderer + 'static> std::fmt::Debug for Environment<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("clock", &self.clock)
            .field("presets", &self.presets.len())
            .field("seasons", &self.seasons.seasons.len())
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl<R: SkyRenderer + 'static> Environment<R> {
    /// Wires a clock, a sky and a preset library together.
    #[must_use]
    pub fn new(clock: WorldClock, sky: DynamicSky<R>, presets: PresetLibrary) -> Self {
        let parameters = Arc::clone(sky.parameters());
        let sky = Arc::new(Mutex::new(sky));
        let presenter: SharedPresenter = sky.clone();
        Self {
            clock,
            sky,
            presenter,
            presets,
            seasons: SeasonCycle::default(),
            parameters,
            events: EventBus::default(),
            initialized: false,
        }
    }

    /// Sets the preset applied by `initialize`.
    pub fn with_initial_preset(self, name: &str) -> EnvironmentResult<Self> {
        let preset = self.presets.get(name)?;
        self.sky.lock().set_preset(Some(preset));
        Ok(self)
    }

    /// Attaches seasons, checking their presets exist.
    pub fn with_seasons(mut self, seasons: SeasonCycle) -> EnvironmentResult<Self> {
        seasons.validate(Some(&self.presets))?;
        self.seasons = seasons;
        Ok(self)
    }

    /// The world clock.
    #[must_use]
    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// The world clock, for subscribing to calendar events.
    pub fn clock_mut(&mut self) -> &mut WorldClock {
        &mut self.clock
    }

    /// The shared sky.
    #[must_use]
    pub fn sky(&self) -> &Arc<Mutex<DynamicSky<R>>> {
        &self.sky
    }

    /// Loaded presets.
    #[must_use]
    pub fn presets(&self) -> &PresetLibrary {
        &self.presets
    }

    /// Seasons.
    #[must_use]
    pub fn seasons(&self) -> &SeasonCycle {
        &self.seasons
    }

    /// Weather parameters shared with ground effects.
    #[must_use]
    pub fn parameters(&self) -> &SharedParameters {
        &self.parameters
    }

    /// Event bus for polling consumers.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Whether `initialize` has run without a matching `shutdown`.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Footstep effects reading this environment's weather parameters.
    #[must_use]
    pub fn footstep_effects(&self, settings: FootstepSettings) -> FootstepEffects {
        FootstepEffects::new(settings, Arc::clone(&self.parameters))
    }

    /// Registers the sky with the clock, initializes it at the clock's time
    /// of day, and starts the preset's transition if it animates.
    pub fn initialize(&mut self) {
        if self.initialized {
            debug!("Environment already initialized");
            return;
        }

        self.clock.register_presenter(&self.presenter);
        let time_of_day = self.clock.time_of_day();
        let animated = {
            let mut sky = self.sky.lock();
            sky.initialize_at(time_of_day);
            sky.preset()
                .filter(|preset| preset.weather_type.is_precipitation())
                .cloned()
        };
        if let Some(preset) = animated {
            self.start_transition(preset);
        }

        self.initialized = true;
        info!("Environment initialized at {}", self.clock.date_time());
    }

    /// Unregisters the sky from the clock.
    pub fn shutdown(&mut self) {
        self.clock.unregister_presenter(&self.presenter);
        self.initialized = false;
        info!("Environment shut down at {}", self.clock.date_time());
    }

    /// Drives one frame: the clock, scheduled events, then the weather
    /// transition.
    pub fn update(&mut self, delta_real_seconds: f32) -> EnvironmentResult<ClockTick> {
        let tick = self.clock.advance(delta_real_seconds)?;
        let at = self.clock.date_time();

        if tick.time_advanced {
            self.events.publish(EnvironmentEvent::TimeAdvanced {
                at,
                time_of_day: at.time_of_day(),
            });
            for event in tick.calendar.events() {
                self.events
                    .publish(EnvironmentEvent::Calendar(CalendarNotice { event, at }));
            }
        }
        if tick.weather_evaluated {
            self.events.publish(EnvironmentEvent::WeatherEvaluated { at });
        }

        for fired in &tick.fired {
            self.events.publish(EnvironmentEvent::Scheduled {
                due: fired.due,
                event: fired.payload.clone(),
            });
            if let ScheduledEvent::WeatherChange { preset } = &fired.payload {
                if let Err(e) = self.change_weather(preset, false) {
                    warn!("Scheduled weather change failed: {e}");
                }
            }
        }

        let (step, preset) = {
            let mut sky = self.sky.lock();
            let step = sky.tick(delta_real_seconds)?;
            (step, sky.preset().map(|preset| preset.name.clone()))
        };
        if let (Some(step), Some(preset)) = (step, preset) {
            if step.progress >= 1.0 {
                info!("Weather transition to '{preset}' complete");
                self.events
                    .publish(EnvironmentEvent::TransitionFinished { preset });
            }
        }

        Ok(tick)
    }

    /// Switches to the named preset, animated unless `immediate`.
    pub fn change_weather(&mut self, name: &str, immediate: bool) -> EnvironmentResult<()> {
        let preset = self.presets.get(name)?;
        if immediate {
            self.sky.lock().apply_preset_immediate(preset);
            self.events.publish(EnvironmentEvent::PresetApplied {
                preset: name.to_string(),
            });
        } else {
            self.start_transition(preset);
        }
        Ok(())
    }

    /// Schedules an animated weather change for a simulated time.
    pub fn schedule_weather_change(
        &mut self,
        due: WorldDateTime,
        name: &str,
    ) -> EnvironmentResult<CallbackId> {
        if !self.presets.contains(name) {
            return Err(EnvironmentError::MissingData(format!(
                "cannot schedule unknown weather preset '{name}'"
            )));
        }
        Ok(self.clock.schedule(
            due,
            ScheduledEvent::WeatherChange {
                preset: name.to_string(),
            },
        ))
    }

    /// The named season's weather pool, most likely first.
    pub fn forecast(&self, season: &str) -> EnvironmentResult<Vec<&WeatherInfo>> {
        self.seasons
            .season(season)
            .map(|season| season.forecast())
            .ok_or_else(|| EnvironmentError::MissingData(format!("unknown season '{season}'")))
    }

    fn start_transition(&mut self, preset: Arc<WeatherPreset>) {
        let name = preset.name.clone();
        self.sky.lock().start_transition(preset);
        self.events
            .publish(EnvironmentEvent::TransitionStarted { preset: name });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarEvent;
    use crate::clock::ClockSettings;
    use crate::dynamic_sky::SkySettings;
    use crate::params::{ParameterCollection, WeatherParameter};
    use crate::preset::WeatherType;
    use crate::renderer::RecordingRenderer;
    use crate::time::TickRate;
    use aether_common::PresetError;

    fn library() -> PresetLibrary {
        let mut library = PresetLibrary::new();
        for (name, weather_type) in [
            ("Clear", WeatherType::Sunny),
            ("Snow", WeatherType::Snowy),
            ("Rain", WeatherType::Rainy),
        ] {
            library
                .insert(WeatherPreset::new(name, weather_type))
                .expect("insert");
        }
        library
    }

    fn environment(start: WorldDateTime) -> Environment<RecordingRenderer> {
        let settings =
            ClockSettings::new(TickRate::default(), 1.0, 10.0).expect("valid clock settings");
        let clock = WorldClock::starting_at(settings, start);
        let sky = DynamicSky::new(
            SkySettings::default(),
            RecordingRenderer::new(),
            ParameterCollection::weather().into_shared(),
        )
        .expect("valid sky settings");
        Environment::new(clock, sky, library())
    }

    fn snow_strength(env: &Environment<RecordingRenderer>) -> f32 {
        env.parameters()
            .read()
            .get(WeatherParameter::SnowStrength)
            .expect("declared")
    }

    #[test]
    fn test_initialize_registers_sky() {
        let mut env = environment(WorldDateTime::default());
        env.initialize();
        assert!(env.clock().has_presenter());
        // The sky starts at the clock's time rather than its configured default
        assert!((env.sky().lock().time_of_day() - 12.0).abs() < f32::EPSILON);

        env.update(1.0).expect("update");
        let expected = 12.0 + 1.0 / 60.0;
        assert!((env.sky().lock().time_of_day() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_shutdown_stops_pushes() {
        let mut env = environment(WorldDateTime::default());
        env.initialize();
        env.shutdown();
        assert!(!env.clock().has_presenter());

        env.update(1.0).expect("update");
        assert!((env.sky().lock().time_of_day() - 12.0).abs() < f32::EPSILON);
        // Time still advances without a presenter
        assert_eq!(env.clock().date_time().minute(), 1);
    }

    #[test]
    fn test_snowy_initial_preset_animates() {
        let mut env = environment(WorldDateTime::default())
            .with_initial_preset("Snow")
            .expect("known preset");
        env.initialize();
        assert!(env.sky().lock().transition().is_running());

        env.update(5.0).expect("update");
        assert!((snow_strength(&env) - 0.5).abs() < 1e-6);

        env.update(5.0).expect("update");
        assert!((snow_strength(&env) - 1.0).abs() < f32::EPSILON);
        assert!(env
            .events()
            .drain()
            .contains(&EnvironmentEvent::TransitionFinished {
                preset: "Snow".to_string()
            }));
    }

    #[test]
    fn test_unknown_preset() {
        let mut env = environment(WorldDateTime::default());
        let err = env.change_weather("Hail", false).expect_err("unknown");
        assert!(matches!(
            err,
            EnvironmentError::Preset(PresetError::UnknownPreset(_))
        ));
        assert!(env.with_initial_preset("Hail").is_err());
    }

    #[test]
    fn test_immediate_change() {
        let mut env = environment(WorldDateTime::default());
        env.initialize();
        env.change_weather("Snow", true).expect("change");
        assert!((snow_strength(&env) - 1.0).abs() < f32::EPSILON);
        assert!(env.sky().lock().transition().progress().is_none());
    }

    #[test]
    fn test_footsteps_share_parameters() {
        let mut env = environment(WorldDateTime::default());
        env.initialize();
        let footsteps = env.footstep_effects(FootstepSettings::default());
        assert!(!footsteps.conditions().expect("declared").is_snowing);

        env.change_weather("Snow", true).expect("change");
        assert!(footsteps.conditions().expect("declared").is_snowing);
    }

    #[test]
    fn test_scheduled_weather_change() {
        let start = WorldDateTime::default();
        let mut env = environment(start);
        env.initialize();
        let due = start.advanced_by(TickRate::default());
        env.schedule_weather_change(due, "Rain").expect("schedule");
        assert!(env.schedule_weather_change(due, "Hail").is_err());

        env.update(1.0).expect("update");
        let sky = env.sky().lock();
        assert_eq!(sky.preset().map(|p| p.name.as_str()), Some("Rain"));
        assert!(sky.transition().progress().is_some());
        drop(sky);

        let events = env.events().drain();
        assert!(events.contains(&EnvironmentEvent::Scheduled {
            due,
            event: ScheduledEvent::WeatherChange {
                preset: "Rain".to_string()
            },
        }));
        assert!(events.contains(&EnvironmentEvent::TransitionStarted {
            preset: "Rain".to_string()
        }));
    }

    #[test]
    fn test_calendar_events_reach_bus() {
        let start = WorldDateTime::from_ymd_hms(1, 1, 1, 12, 59, 0).expect("valid date");
        let mut env = environment(start);
        env.initialize();
        env.update(1.0).expect("update");

        let events = env.events().drain();
        let calendar: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                EnvironmentEvent::Calendar(notice) => Some(notice.event),
                _ => None,
            })
            .collect();
        assert_eq!(calendar, vec![CalendarEvent::HourChanged]);
    }

    #[test]
    fn test_seasons_and_forecast() {
        let seasons = SeasonCycle::from_ron_str(
            r#"(seasons: [(
                name: "Winter",
                default_weather: "Snow",
                weather_pool: [
                    (name: "Frost", weather: "Clear", probability: 0.3),
                    (name: "Snowfall", weather: "Snow", probability: 0.7),
                ],
            )])"#,
        )
        .expect("parse");
        let env = environment(WorldDateTime::default())
            .with_seasons(seasons)
            .expect("known presets");

        let forecast = env.forecast("Winter").expect("known season");
        assert_eq!(forecast[0].name, "Snowfall");
        assert!(env.forecast("Monsoon").is_err());

        let unknown = SeasonCycle::from_ron_str(
            r#"(seasons: [(name: "Wet", default_weather: "Monsoon")])"#,
        )
        .expect("parse");
        assert!(environment(WorldDateTime::default())
            .with_seasons(unknown)
            .is_err());
    }

    #[test]
    fn test_negative_delta_is_rejected() {
        let mut env = environment(WorldDateTime::default());
        assert!(matches!(
            env.update(-1.0),
            Err(EnvironmentError::InvalidArgument(_))
        ));
    }
}
