use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Wall clock of the institution. Every date written to a registry is local
/// to this time zone, not to the server.
#[derive(Clone, Copy, Debug)]
pub struct InstitutionClock {
    timezone: Tz,
}

impl InstitutionClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub fn local_timestamp(&self) -> NaiveDateTime {
        self.now().naive_local()
    }
}

impl Default for InstitutionClock {
    fn default() -> Self {
        Self::new(chrono_tz::America::Mexico_City)
    }
}
