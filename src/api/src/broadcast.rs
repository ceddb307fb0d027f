use crate::clock::InstitutionClock;
use crate::configuration::BroadcastSettings;
use crate::domain::email_client::{Attachment, EmailClient};
use crate::domain::remote_store::RemoteStore;
use crate::domain::subscriber::SubscriberRecord;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_repository::SubscriberRepository;
use crate::notifications::{broadcast_report, convocatoria_announcement};
use crate::registry::RegistryFile;
use crate::utils::error_chain_fmt;
use anyhow::Context;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Instrument;

#[derive(thiserror::Error)]
pub enum BroadcastError {
    #[error("There is no convocatoria PDF to send.")]
    MissingDocument,
    #[error("A broadcast is already running.")]
    AlreadyRunning,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for BroadcastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

impl BroadcastReport {
    /// Percentage of recipients that were sent the convocatoria.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.sent as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastPacing {
    pub pause_between_emails: Duration,
    pub pause_between_groups: Duration,
    /// Emails per group. Zero disables the pause between groups.
    pub group_size: usize,
}

impl BroadcastPacing {
    pub fn from_settings(settings: &BroadcastSettings) -> Self {
        Self {
            pause_between_emails: settings.pause_between_emails(),
            pause_between_groups: settings.pause_between_groups(),
            group_size: settings.group_size,
        }
    }

    /// Pause after the `sent`-th email (1-based) out of `total`. Nothing is
    /// waited for after the last one.
    pub fn pause_after(&self, sent: usize, total: usize) -> Duration {
        if sent >= total {
            return Duration::ZERO;
        }
        let mut pause = self.pause_between_emails;
        if self.group_size > 0 && sent % self.group_size == 0 {
            pause += self.pause_between_groups;
        }
        pause
    }
}

/// Active subscribers with something that looks like an address. The
/// counter row never receives the convocatoria. Returns the recipients and
/// how many addresses could not be parsed.
pub fn select_recipients(
    records: &[SubscriberRecord],
    counter: &SubscriberEmail,
) -> (Vec<SubscriberEmail>, usize) {
    let mut recipients = Vec::new();
    let mut invalid = 0;
    for record in records
        .iter()
        .filter(|r| r.status.is_active() && r.email.contains('@') && !r.is_counter(counter))
    {
        match SubscriberEmail::parse(record.email.clone()) {
            Ok(email) => recipients.push(email),
            Err(error) => {
                tracing::warn!(
                    error.message = %error,
                    "Skipping an active subscriber. Their stored email is invalid",
                );
                invalid += 1;
            }
        }
    }
    (recipients, invalid)
}

/// Everything a convocatoria broadcast needs.
#[derive(Clone)]
pub struct Broadcaster {
    pub repo: Arc<dyn SubscriberRepository>,
    pub email_client: Arc<dyn EmailClient>,
    pub store: Arc<dyn RemoteStore>,
    pub document: RegistryFile,
    pub pacing: BroadcastPacing,
    pub clock: InstitutionClock,
    pub counter_email: SubscriberEmail,
    pub notification_email: SubscriberEmail,
}

impl Broadcaster {
    #[tracing::instrument(name = "Broadcasting the convocatoria", skip(self))]
    pub async fn run(&self) -> Result<BroadcastReport, BroadcastError> {
        let attachment = self.load_document().await?;

        let broadcasts_sent = self
            .repo
            .record_broadcast(&self.counter_email, self.clock.today())
            .await
            .context("Failed to update the broadcast counter")?;
        tracing::info!(broadcasts_sent, "Starting convocatoria broadcast");

        let snapshot = self
            .repo
            .snapshot()
            .await
            .context("Failed to read the subscriber registry")?;
        let (recipients, invalid) = select_recipients(&snapshot.records, &self.counter_email);

        if recipients.is_empty() {
            tracing::info!(invalid, "There are no active subscribers with a valid email");
            return Ok(BroadcastReport::default());
        }
        let mut report = BroadcastReport {
            total: recipients.len() + invalid,
            sent: 0,
            failed: invalid,
        };

        let content = convocatoria_announcement();
        for (index, recipient) in recipients.iter().enumerate() {
            match self
                .email_client
                .send_email_to(
                    recipient,
                    &content.subject,
                    &content.html,
                    &content.text,
                    Some(&attachment),
                )
                .await
            {
                Ok(()) => report.sent += 1,
                Err(error) => {
                    tracing::warn!(
                        error.cause_chain = ?error,
                        error.message = %error,
                        recipient = %recipient,
                        "Failed to send the convocatoria",
                    );
                    report.failed += 1;
                }
            }

            let pause = self.pacing.pause_after(index + 1, recipients.len());
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        tracing::info!(
            total = report.total,
            sent = report.sent,
            failed = report.failed,
            "Convocatoria broadcast finished"
        );
        if report.sent > 0 {
            self.send_report(&report, &attachment).await;
        }
        Ok(report)
    }

    async fn load_document(&self) -> Result<Attachment, BroadcastError> {
        if !self.document.exists().await {
            self.document.sync(self.store.as_ref()).await;
        }
        if !self.document.exists().await {
            return Err(BroadcastError::MissingDocument);
        }
        let content = self.document.read_bytes().await?;
        Ok(Attachment::pdf(self.document.file_name(), content))
    }

    async fn send_report(&self, report: &BroadcastReport, attachment: &Attachment) {
        let content = broadcast_report(report, self.clock.local_timestamp());
        if let Err(error) = self
            .email_client
            .send_email_to(
                &self.notification_email,
                &content.subject,
                &content.html,
                &content.text,
                Some(attachment),
            )
            .await
        {
            tracing::warn!(
                error.cause_chain = ?error,
                error.message = %error,
                "Failed to send the broadcast report",
            );
        }
    }

    /// Runs the broadcast in the background, recording its outcome in the
    /// tracker. A run that panics is recorded as failed.
    pub fn spawn(self, tracker: BroadcastTracker) -> Result<(), BroadcastError> {
        let clock = self.clock;
        tracker.try_start(clock.local_timestamp())?;
        let span = tracing::info_span!("Background convocatoria broadcast");
        tokio::spawn(
            async move {
                let run = tokio::spawn(async move { self.run().await }.in_current_span());
                let outcome = match run.await {
                    Ok(outcome) => outcome,
                    Err(e) => Err(BroadcastError::UnexpectedError(anyhow::anyhow!(
                        "The broadcast stopped unexpectedly: {}",
                        e
                    ))),
                };
                if let Err(error) = &outcome {
                    tracing::error!(
                        error.cause_chain = ?error,
                        error.message = %error,
                        "Convocatoria broadcast failed",
                    );
                }
                tracker.finish(&outcome, clock.local_timestamp());
            }
            .instrument(span),
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastStatus {
    Idle,
    Running {
        started_at: NaiveDateTime,
    },
    Finished {
        report: BroadcastReport,
        finished_at: NaiveDateTime,
    },
    Failed {
        message: String,
        finished_at: NaiveDateTime,
    },
}

/// Shared state of the broadcast started from the admin pages. At most one
/// broadcast runs at a time.
#[derive(Clone)]
pub struct BroadcastTracker {
    state: Arc<Mutex<BroadcastStatus>>,
}

impl Default for BroadcastTracker {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(BroadcastStatus::Idle)),
        }
    }
}

impl BroadcastTracker {
    fn state(&self) -> std::sync::MutexGuard<'_, BroadcastStatus> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> BroadcastStatus {
        self.state().clone()
    }

    pub fn try_start(&self, started_at: NaiveDateTime) -> Result<(), BroadcastError> {
        let mut state = self.state();
        if matches!(*state, BroadcastStatus::Running { .. }) {
            return Err(BroadcastError::AlreadyRunning);
        }
        *state = BroadcastStatus::Running { started_at };
        Ok(())
    }

    pub fn finish(
        &self,
        outcome: &Result<BroadcastReport, BroadcastError>,
        finished_at: NaiveDateTime,
    ) {
        *self.state() = match outcome {
            Ok(report) => BroadcastStatus::Finished {
                report: *report,
                finished_at,
            },
            Err(error) => BroadcastStatus::Failed {
                message: error.to_string(),
                finished_at,
            },
        };
    }
}
