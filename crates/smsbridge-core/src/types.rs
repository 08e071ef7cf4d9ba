use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::BranchStyle;

/// Canonical unit of work: one SMS send instruction after synonym
/// resolution. `scheduled_at` being present switches every downstream step
/// (line format, success vocabulary) to scheduled semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsRequest {
    pub phone: String,
    pub text: String,
    /// Falls back to the configured default campaign when absent.
    pub campaign_ref: Option<String>,
    /// Local wall-clock send time; no timezone — the gateway interprets it
    /// in its own locale.
    pub scheduled_at: Option<NaiveDateTime>,
}

impl SmsRequest {
    pub fn new(phone: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            text: text.into(),
            campaign_ref: None,
            scheduled_at: None,
        }
    }

    pub fn scheduled(mut self, at: NaiveDateTime) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_at.is_some()
    }
}

/// Ordered sequence of requests dispatched as one gateway call.
/// Insertion order is preserved through encoding — the gateway correlates
/// multi-record responses positionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchBatch {
    pub requests: Vec<SmsRequest>,
    /// Campaign reference for the outer gateway call.
    pub campaign_ref: String,
}

impl DispatchBatch {
    pub fn new(requests: Vec<SmsRequest>, campaign_ref: impl Into<String>) -> Self {
        Self {
            requests,
            campaign_ref: campaign_ref.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// A batch is scheduled when any record carries a send time.
    pub fn is_scheduled(&self) -> bool {
        self.requests.iter().any(SmsRequest::is_scheduled)
    }
}

/// The single value the orchestrator's execute caller receives.
///
/// `Failed` and `NotSent` are one concept — near-duplicate handler revisions
/// in the field used both vocabularies, so the enum keeps one variant per
/// word and [`DispatchOutcome::branch_value`] renders whichever the deployed
/// journey expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchOutcome {
    Sent,
    Scheduled,
    Failed,
    NotSent,
}

impl DispatchOutcome {
    /// Render the branch discriminator for the configured caller vocabulary.
    pub fn branch_value(self, style: BranchStyle) -> &'static str {
        match (style, self) {
            (BranchStyle::Instant, DispatchOutcome::Sent) => "sent",
            (BranchStyle::Instant, DispatchOutcome::Scheduled) => "sent",
            (BranchStyle::Instant, _) => "notsent",
            (BranchStyle::Scheduled, DispatchOutcome::Sent) => "sent",
            (BranchStyle::Scheduled, DispatchOutcome::Scheduled) => "scheduled",
            (BranchStyle::Scheduled, _) => "failed",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, DispatchOutcome::Sent | DispatchOutcome::Scheduled)
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Sent => write!(f, "sent"),
            DispatchOutcome::Scheduled => write!(f, "scheduled"),
            DispatchOutcome::Failed => write!(f, "failed"),
            DispatchOutcome::NotSent => write!(f, "notsent"),
        }
    }
}
