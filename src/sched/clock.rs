use chrono::{Local, NaiveDateTime};

/// Wall-clock source. Injected into the scheduler so day/night transitions
/// can be exercised in tests without waiting for a real night.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The local system clock; night anchors are local times of day.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
