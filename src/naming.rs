//! Run names: `<item>-<yyyy-MM-dd-hh-mm-ss>`.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Hour field used in run names.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameClock {
    /// `01`-`12` with no AM/PM marker. Runs twelve hours apart share a name.
    #[default]
    #[serde(rename = "12h")]
    TwelveHour,
    /// `00`-`23`.
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl NameClock {
    fn pattern(self) -> &'static str {
        match self {
            NameClock::TwelveHour => "%Y-%m-%d-%I-%M-%S",
            NameClock::TwentyFourHour => "%Y-%m-%d-%H-%M-%S",
        }
    }
}

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

pub fn derive_run_name(item_name: &str, now: NaiveDateTime, clock: NameClock) -> String {
    format!("{item_name}-{}", now.format(clock.pattern()))
}
