use crate::domain::employee_number::EmployeeNumber;
use crate::domain::status::Status;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use serde::{Deserialize, Serialize};

pub const SUBSCRIBER_HEADER: [&str; 5] = [
    "Fecha",
    "Nombre completo",
    "Correo electronico",
    "Numero economico",
    "Estado",
];

/// Name written on the row that counts convocatoria broadcasts.
pub const COUNTER_ROW_NAME: &str = "CONVOCATORIA";

/// One row of `registro_convocatorias.csv`, exactly as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriberRecord {
    #[serde(rename = "Fecha")]
    pub date: String,
    #[serde(rename = "Nombre completo")]
    pub name: String,
    #[serde(rename = "Correo electronico", alias = "Correo Electronico")]
    pub email: String,
    #[serde(rename = "Numero economico")]
    pub employee_number: String,
    #[serde(rename = "Estado")]
    pub status: Status,
}

impl SubscriberRecord {
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_lowercase();
        self
    }

    pub fn has_email(&self, email: &SubscriberEmail) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.as_ref())
    }

    pub fn is_counter(&self, counter: &SubscriberEmail) -> bool {
        self.has_email(counter)
    }

    pub fn counter(counter: &SubscriberEmail, value: u64, date: String) -> Self {
        Self {
            date,
            name: COUNTER_ROW_NAME.to_string(),
            email: counter.as_ref().to_string(),
            employee_number: value.to_string(),
            status: Status::Inactive,
        }
    }
}

/// Broadcasts sent so far, read from the counter row's `Numero economico`.
///
/// Spreadsheet round trips turn `3` into `3.0`, so decimals are accepted.
/// Anything unreadable counts as zero.
pub fn parse_counter(raw: &str) -> u64 {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u64>() {
        return value;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value.trunc() as u64,
        _ => 0,
    }
}

#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub name: SubscriberName,
    pub employee_number: EmployeeNumber,
}

impl NewSubscriber {
    pub fn into_record(&self, date: String) -> SubscriberRecord {
        SubscriberRecord {
            date,
            name: self.name.as_ref().to_string(),
            email: self.email.as_ref().to_string(),
            employee_number: self.employee_number.as_ref().to_string(),
            status: Status::Active,
        }
    }
}
