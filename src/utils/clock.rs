//! Source de l'heure courante, injectée dans les stores et le service

use std::cell::Cell;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, Utc};

pub trait Clock {
    /// Instant courant, pour les horodatages `created_at`/`updated_at`
    fn now(&self) -> DateTime<Utc>;

    /// Heure murale locale, à comparer avec la date et l'heure d'une visite
    fn local_now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.local_now().date()
    }
}

/// L'horloge du système
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Une horloge arrêtée, avancée à la main. L'heure locale est
/// considérée identique à l'UTC.
#[derive(Debug)]
pub struct FixedClock(Cell<NaiveDateTime>);

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self(Cell::new(at))
    }

    pub fn set(&self, at: NaiveDateTime) {
        self.0.set(at)
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get().and_utc()
    }

    fn local_now(&self) -> NaiveDateTime {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let clock = FixedClock::new(start);

        assert_eq!(clock.local_now(), start);
        assert_eq!(clock.now().naive_utc(), start);

        clock.advance(Duration::days(1));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 1, 11).unwrap());
    }
}
