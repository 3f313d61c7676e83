//! Calendar clock.
//!
//! Expiration dates are compared against the *local* calendar date, never the UTC date,
//! so a product expiring today stays valid until local midnight.

use chrono::{Local, NaiveDate};

/// Source of "today" for date validation.
pub trait Clock {
    /// Current local calendar date.
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the process' local timezone.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a fixed date (tests, replays).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
