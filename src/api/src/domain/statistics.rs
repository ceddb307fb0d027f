use crate::domain::correction_request::CorrectionRecord;
use crate::domain::registry_snapshot::RegistrySnapshot;
use crate::domain::subscriber::{parse_counter, SubscriberRecord};
use crate::domain::subscriber_email::SubscriberEmail;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

pub const ROLLING_WINDOW_DAYS: i64 = 180;

/// Reads the leading `%Y-%m-%d` of a registry date. A time may follow,
/// separated by a space or a `T`.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date = raw.get(..10)?;
    match raw[10..].chars().next() {
        None | Some(' ') | Some('T') => NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        Some(_) => None,
    }
}

pub fn window_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(ROLLING_WINDOW_DAYS)
}

pub fn is_within_window(raw_date: &str, today: NaiveDate) -> bool {
    parse_record_date(raw_date).is_some_and(|date| date >= window_start(today))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub label: String,
    pub count: usize,
}

/// Counts labels case-insensitively, keeping the first spelling seen.
/// Sorted by count, highest first, then by label.
pub fn count_by_status<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<StatusCount> {
    let mut counts: Vec<StatusCount> = Vec::new();
    for label in labels {
        match counts
            .iter_mut()
            .find(|c| c.label.to_lowercase() == label.to_lowercase())
        {
            Some(existing) => existing.count += 1,
            None => counts.push(StatusCount {
                label: label.to_string(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    counts
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionStatistics {
    pub window_counts: Vec<StatusCount>,
    pub window_total: usize,
    pub historic_counts: Vec<StatusCount>,
    pub historic_total: usize,
}

impl CorrectionStatistics {
    pub fn compute(snapshot: &RegistrySnapshot<CorrectionRecord>, today: NaiveDate) -> Self {
        let window: Vec<&CorrectionRecord> = snapshot
            .records
            .iter()
            .filter(|r| is_within_window(&r.submitted_at, today))
            .collect();

        Self {
            window_counts: count_by_status(window.iter().map(|r| r.status.dashboard_label())),
            window_total: window.len(),
            historic_counts: count_by_status(
                snapshot.records.iter().map(|r| r.status.dashboard_label()),
            ),
            historic_total: snapshot.historic_total(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvocatoriaStatistics {
    pub window_subscribers: usize,
    pub historic_subscribers: usize,
    pub active_subscribers: usize,
    pub broadcasts_sent: u64,
}

impl ConvocatoriaStatistics {
    pub fn compute(
        snapshot: &RegistrySnapshot<SubscriberRecord>,
        counter: &SubscriberEmail,
        today: NaiveDate,
    ) -> Self {
        let subscribers: Vec<&SubscriberRecord> = snapshot
            .records
            .iter()
            .filter(|r| !r.is_counter(counter))
            .collect();
        let broadcasts_sent = snapshot
            .records
            .iter()
            .find(|r| r.is_counter(counter))
            .map(|r| parse_counter(&r.employee_number))
            .unwrap_or(0);

        Self {
            window_subscribers: subscribers
                .iter()
                .filter(|r| is_within_window(&r.date, today))
                .count(),
            historic_subscribers: subscribers.len(),
            active_subscribers: subscribers.iter().filter(|r| r.status.is_active()).count(),
            broadcasts_sent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductivitySummary {
    pub generated_on: NaiveDate,
    pub corrections: CorrectionStatistics,
    pub convocatorias: ConvocatoriaStatistics,
}
