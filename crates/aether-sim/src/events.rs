//! Environment event bus for consumers that poll instead of subscribing.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::calendar::CalendarNotice;
use crate::schedule::ScheduledEvent;
use crate::time::WorldDateTime;

/// Environment events.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentEvent {
    /// Simulated time moved forward.
    TimeAdvanced {
        /// New date-time.
        at: WorldDateTime,
        /// New time of day in hours.
        time_of_day: f32,
    },
    /// An hour, day or week rolled over.
    Calendar(CalendarNotice),
    /// The weather hook ran.
    WeatherEvaluated {
        /// Date-time of the evaluation.
        at: WorldDateTime,
    },
    /// A scheduled event came due.
    Scheduled {
        /// When it was due.
        due: WorldDateTime,
        /// The event.
        event: ScheduledEvent,
    },
    /// A preset was applied without animation.
    PresetApplied {
        /// Preset name.
        preset: String,
    },
    /// A weather transition started.
    TransitionStarted {
        /// Target preset name.
        preset: String,
    },
    /// A weather transition reached full strength.
    TransitionFinished {
        /// Target preset name.
        preset: String,
    },
}

/// Bounded channel of environment events.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<EnvironmentEvent>,
    receiver: Receiver<EnvironmentEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates an event bus holding at most `capacity` undrained events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event. Returns `false` if the bus was full and the event
    /// was dropped.
    pub fn publish(&self, event: EnvironmentEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<EnvironmentEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// A receiver handle for another consumer. Each event goes to one receiver.
    #[must_use]
    pub fn receiver(&self) -> Receiver<EnvironmentEvent> {
        self.receiver.clone()
    }
}
