//! Notification transport for donor alerts.
//!
//! Delivery is fire-and-forget: a failed notification is logged and counted,
//! never surfaced as an error of the match or status change that caused it.

use std::sync::Mutex;

use thiserror::Error;
use tracing::{info, warn};

use crate::models::RequestSummary;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Notification to donor {donor_id} failed: {reason}")]
pub struct NotifyError {
    pub donor_id: String,
    pub reason: String,
}

/// Delivers a request summary to one donor.
pub trait Notifier: Send + Sync {
    fn notify(&self, donor_id: &str, summary: &RequestSummary) -> Result<(), NotifyError>;
}

/// Outcome of notifying a batch of donors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

/// Notify every donor in `donor_ids`, logging failures instead of returning them.
pub fn dispatch<'a, I>(
    notifier: &dyn Notifier,
    donor_ids: I,
    summary: &RequestSummary,
) -> DispatchReport
where
    I: IntoIterator<Item = &'a str>,
{
    let mut report = DispatchReport::default();
    for donor_id in donor_ids {
        match notifier.notify(donor_id, summary) {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!(
                    request_id = %summary.request_id,
                    %donor_id,
                    error = %e,
                    "donor notification failed"
                );
                report.failed += 1;
            }
        }
    }
    report
}

/// Writes alerts to the log. Default when no transport is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, donor_id: &str, summary: &RequestSummary) -> Result<(), NotifyError> {
        info!(
            %donor_id,
            request_id = %summary.request_id,
            blood_type = %summary.blood_type,
            urgency = %summary.urgency,
            city = %summary.city,
            "donor alert"
        );
        Ok(())
    }
}

/// Keeps every alert in memory, for tests and previews.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, RequestSummary)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts delivered so far, oldest first.
    pub fn sent(&self) -> Vec<(String, RequestSummary)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, donor_id: &str, summary: &RequestSummary) -> Result<(), NotifyError> {
        let mut sent = self.sent.lock().map_err(|_| NotifyError {
            donor_id: donor_id.to_string(),
            reason: "recorder lock poisoned".into(),
        })?;
        sent.push((donor_id.to_string(), summary.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloodType, Urgency};

    struct FailingFor(&'static str);

    impl Notifier for FailingFor {
        fn notify(&self, donor_id: &str, _summary: &RequestSummary) -> Result<(), NotifyError> {
            if donor_id == self.0 {
                return Err(NotifyError {
                    donor_id: donor_id.into(),
                    reason: "unreachable".into(),
                });
            }
            Ok(())
        }
    }

    fn summary() -> RequestSummary {
        RequestSummary {
            request_id: "req-1".into(),
            blood_type: BloodType::ONegative,
            units: 2,
            urgency: Urgency::Critical,
            city: "Taiz".into(),
            hospital: "Al-Thawra".into(),
            contact_phone: "+967777123456".into(),
        }
    }

    #[test]
    fn test_dispatch_counts_failures() {
        let report = dispatch(&FailingFor("d2"), ["d1", "d2", "d3"], &summary());
        assert_eq!(report, DispatchReport { sent: 2, failed: 1 });
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        dispatch(&notifier, ["d1", "d2"], &summary());

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "d1");
        assert_eq!(sent[1].1.request_id, "req-1");
    }

    #[test]
    fn test_log_notifier_never_fails() {
        assert!(LogNotifier.notify("d1", &summary()).is_ok());
    }
}
