//! Edge-triggered calendar notifications.
//!
//! Compares the clock state before and after a time advance and raises hour,
//! day and week rollover events. Only the before/after pair is inspected: a
//! single advance that crosses several hours still raises one hour event, and
//! a week event needs the exact Sunday → Monday step.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use aether_common::ListenerId;

use crate::delegate::Listeners;
use crate::time::WorldDateTime;

/// Calendar rollover kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarEvent {
    /// The hour of day changed.
    HourChanged,
    /// The day of the week changed.
    DayChanged,
    /// The week rolled over from Sunday to Monday.
    WeekChanged,
}

impl CalendarEvent {
    /// Get the display name for this event.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::HourChanged => "Hour changed",
            Self::DayChanged => "Day changed",
            Self::WeekChanged => "Week changed",
        }
    }
}

/// Which calendar events a single advance raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalendarChanges {
    /// Hour event fired.
    pub hour: bool,
    /// Day event fired.
    pub day: bool,
    /// Week event fired.
    pub week: bool,
}

impl CalendarChanges {
    /// Compares two timestamps.
    #[must_use]
    pub fn between(old: &WorldDateTime, new: &WorldDateTime) -> Self {
        Self {
            hour: old.hour() != new.hour(),
            day: old.day_of_week() != new.day_of_week(),
            week: old.day_of_week() == Weekday::Sun && new.day_of_week() == Weekday::Mon,
        }
    }

    /// Whether nothing fired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.hour || self.day || self.week)
    }

    /// The fired events in broadcast order (hour, day, week).
    #[must_use]
    pub fn events(&self) -> Vec<CalendarEvent> {
        let mut events = Vec::with_capacity(3);
        if self.hour {
            events.push(CalendarEvent::HourChanged);
        }
        if self.day {
            events.push(CalendarEvent::DayChanged);
        }
        if self.week {
            events.push(CalendarEvent::WeekChanged);
        }
        events
    }
}

/// A calendar rollover as delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarNotice {
    /// What rolled over.
    pub event: CalendarEvent,
    /// The timestamp after the advance.
    pub at: WorldDateTime,
}

/// Broadcasts calendar rollovers to subscribed listeners.
///
/// Listeners for a single kind are filtered views over one ordered list, so
/// every `ListenerId` is unique across kinds.
#[derive(Debug, Default)]
pub struct CalendarEventNotifier {
    listeners: Listeners<CalendarNotice>,
}

impl CalendarEventNotifier {
    /// Creates a notifier with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn on_kind(
        &mut self,
        kind: CalendarEvent,
        mut listener: impl FnMut(&WorldDateTime) + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(move |notice: &CalendarNotice| {
            if notice.event == kind {
                listener(&notice.at);
            }
        })
    }

    /// Subscribes to hour rollovers.
    pub fn on_hour_changed(&mut self, listener: impl FnMut(&WorldDateTime) + 'static) -> ListenerId {
        self.on_kind(CalendarEvent::HourChanged, listener)
    }

    /// Subscribes to day rollovers.
    pub fn on_day_changed(&mut self, listener: impl FnMut(&WorldDateTime) + 'static) -> ListenerId {
        self.on_kind(CalendarEvent::DayChanged, listener)
    }

    /// Subscribes to week rollovers.
    pub fn on_week_changed(&mut self, listener: impl FnMut(&WorldDateTime) + 'static) -> ListenerId {
        self.on_kind(CalendarEvent::WeekChanged, listener)
    }

    /// Subscribes one listener to every calendar event kind.
    pub fn on_any(&mut self, listener: impl FnMut(&CalendarNotice) + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Removes a listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Whether any listener is subscribed.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.listeners.is_bound()
    }

    /// Compares `old` and `new` and broadcasts the resulting events.
    pub fn check(&mut self, old: &WorldDateTime, new: &WorldDateTime) -> CalendarChanges {
        let changes = CalendarChanges::between(old, new);
        if !self.listeners.is_bound() {
            return changes;
        }

        for event in changes.events() {
            self.listeners.broadcast(&CalendarNotice { event, at: *new });
        }

        changes
    }
}
