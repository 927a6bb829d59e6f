//! World clock with a fixed-step cadence decoupled from frame time.
//!
//! The clock owns the simulated date-time and two real-time accumulators, one
//! for time advancement and one for weather evaluation. Each frame's delta is
//! added to both; when an accumulator reaches its threshold the clock runs
//! exactly one step of that branch and resets the accumulator to zero, so
//! several thresholds' worth of delta in one call still yields a single step.

use std::sync::{Arc, Weak};

use aether_common::{CallbackId, ConfigError, EnvironmentError, EnvironmentResult, ListenerId};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::calendar::{CalendarChanges, CalendarEventNotifier};
use crate::delegate::Listeners;
use crate::schedule::{DueCallback, ScheduledCallbacks, ScheduledEvent};
use crate::time::{TickRate, WorldDateTime};

/// Default real seconds between time advances.
pub const DEFAULT_TIME_TICK_FREQUENCY: f32 = 1.0;
/// Default real seconds between weather evaluations.
pub const DEFAULT_WEATHER_TICK_FREQUENCY: f32 = 10.0;

/// Sink that receives the time of day after every time advance.
pub trait TimeOfDayPresenter {
    /// Called with the new time of day in hours, [0, 24).
    fn on_time_of_day_changed(&mut self, time_of_day: f32);
}

/// Presenter shared between its owner and the clock.
pub type SharedPresenter = Arc<Mutex<dyn TimeOfDayPresenter>>;

/// Cadence settings for the world clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSettings {
    tick_rate: TickRate,
    time_tick_frequency: f32,
    weather_tick_frequency: f32,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            tick_rate: TickRate::default(),
            time_tick_frequency: DEFAULT_TIME_TICK_FREQUENCY,
            weather_tick_frequency: DEFAULT_WEATHER_TICK_FREQUENCY,
        }
    }
}

impl ClockSettings {
    /// Validates and builds cadence settings.
    ///
    /// Both frequencies must be positive and finite. Callers reading untrusted
    /// configuration take the absolute value first; this never flips a sign.
    pub fn new(
        tick_rate: TickRate,
        time_tick_frequency: f32,
        weather_tick_frequency: f32,
    ) -> Result<Self, ConfigError> {
        validate_frequency("time_tick_frequency", time_tick_frequency)?;
        validate_frequency("weather_tick_frequency", weather_tick_frequency)?;
        Ok(Self {
            tick_rate,
            time_tick_frequency,
            weather_tick_frequency,
        })
    }

    /// Simulated time added per advance.
    #[must_use]
    pub fn tick_rate(&self) -> TickRate {
        self.tick_rate
    }

    /// Real seconds between time advances.
    #[must_use]
    pub fn time_tick_frequency(&self) -> f32 {
        self.time_tick_frequency
    }

    /// Real seconds between weather evaluations.
    #[must_use]
    pub fn weather_tick_frequency(&self) -> f32 {
        self.weather_tick_frequency
    }
}

fn validate_frequency(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveFrequency { name, value })
    }
}

/// What a single `advance` call did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClockTick {
    /// Whether simulated time moved forward.
    pub time_advanced: bool,
    /// Whether the weather hook ran.
    pub weather_evaluated: bool,
    /// Calendar events raised by the time advance.
    pub calendar: CalendarChanges,
    /// Scheduled callbacks that came due, earliest first.
    pub fired: Vec<DueCallback<ScheduledEvent>>,
}

/// Owns simulated time and drives it at a fixed cadence.
#[derive(Debug)]
pub struct WorldClock {
    settings: ClockSettings,
    date_time: WorldDateTime,
    time_accumulator: f32,
    weather_accumulator: f32,
    presenter: Option<Weak<Mutex<dyn TimeOfDayPresenter>>>,
    calendar: CalendarEventNotifier,
    scheduled: ScheduledCallbacks<ScheduledEvent>,
    weather_tick: Listeners<WorldDateTime>,
    scheduled_fired: Listeners<DueCallback<ScheduledEvent>>,
}

impl Default for WorldClock {
    fn default() -> Self {
        Self::new(ClockSettings::default())
    }
}

impl WorldClock {
    /// Creates a clock starting at the default time (day one, 12:00).
    #[must_use]
    pub fn new(settings: ClockSettings) -> Self {
        Self::starting_at(settings, WorldDateTime::default())
    }

    /// Creates a clock starting at a restored time.
    #[must_use]
    pub fn starting_at(settings: ClockSettings, date_time: WorldDateTime) -> Self {
        Self {
            settings,
            date_time,
            time_accumulator: 0.0,
            weather_accumulator: 0.0,
            presenter: None,
            calendar: CalendarEventNotifier::new(),
            scheduled: ScheduledCallbacks::new(),
            weather_tick: Listeners::new(),
            scheduled_fired: Listeners::new(),
        }
    }

    /// Replaces the cadence settings.
    ///
    /// Accumulated real time and the current date-time are kept.
    pub fn configure(
        &mut self,
        tick_rate: TickRate,
        time_tick_frequency: f32,
        weather_tick_frequency: f32,
    ) -> Result<(), ConfigError> {
        self.settings = ClockSettings::new(tick_rate, time_tick_frequency, weather_tick_frequency)?;
        info!(
            "Clock configured: {}s per tick, time every {}s, weather every {}s",
            tick_rate.seconds(),
            time_tick_frequency,
            weather_tick_frequency
        );
        Ok(())
    }

    /// Current cadence settings.
    #[must_use]
    pub fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    /// Current simulated date-time.
    #[must_use]
    pub fn date_time(&self) -> WorldDateTime {
        self.date_time
    }

    /// Current time of day in hours.
    #[must_use]
    pub fn time_of_day(&self) -> f32 {
        self.date_time.time_of_day()
    }

    /// Real seconds accumulated towards the next time advance.
    #[must_use]
    pub fn time_accumulator(&self) -> f32 {
        self.time_accumulator
    }

    /// Real seconds accumulated towards the next weather evaluation.
    #[must_use]
    pub fn weather_accumulator(&self) -> f32 {
        self.weather_accumulator
    }

    /// Calendar notifier, for subscribing to rollovers.
    pub fn calendar_mut(&mut self) -> &mut CalendarEventNotifier {
        &mut self.calendar
    }

    /// Subscribes to the weather evaluation hook.
    pub fn on_weather_tick(&mut self, listener: impl FnMut(&WorldDateTime) + 'static) -> ListenerId {
        self.weather_tick.subscribe(listener)
    }

    /// Removes a weather hook listener.
    pub fn remove_weather_tick(&mut self, id: ListenerId) -> bool {
        self.weather_tick.unsubscribe(id)
    }

    /// Schedules an event for a simulated time.
    ///
    /// Due events are handed back from `advance` right after the time step
    /// that reaches them.
    pub fn schedule(&mut self, due: WorldDateTime, event: ScheduledEvent) -> CallbackId {
        debug!("Scheduled {event:?} for {due}");
        self.scheduled.schedule(due, event)
    }

    /// Subscribes to scheduled events as they come due.
    pub fn on_scheduled(
        &mut self,
        listener: impl FnMut(&DueCallback<ScheduledEvent>) + 'static,
    ) -> ListenerId {
        self.scheduled_fired.subscribe(listener)
    }

    /// Removes a scheduled-event listener.
    pub fn remove_on_scheduled(&mut self, id: ListenerId) -> bool {
        self.scheduled_fired.unsubscribe(id)
    }

    /// Number of scheduled events still pending.
    #[must_use]
    pub fn pending_callbacks(&self) -> usize {
        self.scheduled.len()
    }

    /// Registers the presenter that receives time-of-day pushes.
    ///
    /// The clock keeps only a weak reference; the last registration wins.
    pub fn register_presenter(&mut self, presenter: &SharedPresenter) {
        self.presenter = Some(Arc::downgrade(presenter));
        info!("Registered sky presenter");
    }

    /// Clears the presenter, but only if `presenter` is the registered one.
    pub fn unregister_presenter(&mut self, presenter: &SharedPresenter) {
        let matches = self
            .presenter
            .as_ref()
            .is_some_and(|current| Weak::ptr_eq(current, &Arc::downgrade(presenter)));
        if matches {
            self.presenter = None;
            info!("Unregistered sky presenter");
        }
    }

    /// Whether `presenter` is the currently registered one.
    #[must_use]
    pub fn is_registered(&self, presenter: &SharedPresenter) -> bool {
        self.presenter
            .as_ref()
            .is_some_and(|current| Weak::ptr_eq(current, &Arc::downgrade(presenter)))
    }

    /// Whether any live presenter is registered.
    #[must_use]
    pub fn has_presenter(&self) -> bool {
        self.presenter
            .as_ref()
            .is_some_and(|current| current.strong_count() > 0)
    }

    /// Feeds one frame's real elapsed time into the clock.
    ///
    /// Negative or non-finite deltas are rejected and leave the clock untouched.
    pub fn advance(&mut self, delta_real_seconds: f32) -> EnvironmentResult<ClockTick> {
        if !delta_real_seconds.is_finite() || delta_real_seconds < 0.0 {
            return Err(EnvironmentError::InvalidArgument(format!(
                "delta time must be a non-negative number of seconds, got {delta_real_seconds}"
            )));
        }

        let mut tick = ClockTick::default();

        self.time_accumulator += delta_real_seconds;
        if self.time_accumulator >= self.settings.time_tick_frequency {
            let (calendar, fired) = self.tick_time();
            tick.time_advanced = true;
            tick.calendar = calendar;
            tick.fired = fired;
            self.time_accumulator = 0.0;
        }

        self.weather_accumulator += delta_real_seconds;
        if self.weather_accumulator >= self.settings.weather_tick_frequency {
            self.weather_tick.broadcast(&self.date_time);
            tick.weather_evaluated = true;
            self.weather_accumulator = 0.0;
        }

        Ok(tick)
    }

    fn tick_time(&mut self) -> (CalendarChanges, Vec<DueCallback<ScheduledEvent>>) {
        let previous = self.date_time;
        self.date_time = previous.advanced_by(self.settings.tick_rate);

        let changes = self.calendar.check(&previous, &self.date_time);
        self.push_time_of_day();

        debug!(
            "TOD: {:.3} ({})",
            self.date_time.time_of_day(),
            self.date_time.format_time()
        );
        if changes.hour {
            info!("Current time: {}", self.date_time);
        }

        let fired = self.scheduled.drain_due(self.date_time);
        for callback in &fired {
            self.scheduled_fired.broadcast(callback);
        }
        (changes, fired)
    }

    fn push_time_of_day(&self) {
        let time_of_day = self.date_time.time_of_day();
        match self.presenter.as_ref().and_then(Weak::upgrade) {
            Some(presenter) => presenter.lock().on_time_of_day_changed(time_of_day),
            None => warn!("No sky presenter registered; time of day {time_of_day:.2} not presented"),
        }
    }
}
