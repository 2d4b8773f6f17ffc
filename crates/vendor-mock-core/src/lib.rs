//! Record model and fake-data factory for the vendor onboarding mock.
//!
//! Nothing in this crate performs I/O. Storage lives in
//! `vendor-mock-store-memory` and the HTTP surface in `vendor-mock-service`.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};

mod factory;
pub mod faker;
mod records;

pub use factory::RecordFactory;
pub use records::{
    record_key, Address, Assessment, AssessmentResponse, Check, DueDiligenceCase, Vendor,
};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum CoreError {
    #[error("unknown vendor state: {0}")]
    UnknownState(String),
    #[error("illegal vendor state transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },
    #[error("timestamp error: {0}")]
    Timestamp(String),
}

/// Vendor lifecycle states recognised by the strict transition policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorState {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Suspended,
}

impl VendorState {
    pub const ALL: [Self; 6] = [
        Self::Draft,
        Self::Submitted,
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::Suspended,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Suspended => "SUSPENDED",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DRAFT" => Some(Self::Draft),
            "SUBMITTED" => Some(Self::Submitted),
            "UNDER_REVIEW" => Some(Self::UnderReview),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "SUSPENDED" => Some(Self::Suspended),
            _ => None,
        }
    }

    /// Legal next states. Staying in the current state is always allowed.
    #[must_use]
    pub fn successors(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Submitted],
            Self::Submitted => &[Self::UnderReview, Self::Draft],
            Self::UnderReview => &[Self::Approved, Self::Rejected],
            Self::Rejected => &[Self::Draft],
            Self::Approved => &[Self::Suspended],
            Self::Suspended => &[Self::Approved],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self == next || self.successors().contains(&next)
    }

    /// Checks a move between two raw state strings.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownState`] when either side is not a known
    /// state and [`CoreError::IllegalTransition`] when the move is not an
    /// edge of the lifecycle.
    pub fn validate_transition(current: &str, next: &str) -> Result<Self, CoreError> {
        let from =
            Self::parse(current).ok_or_else(|| CoreError::UnknownState(current.to_string()))?;
        let to = Self::parse(next).ok_or_else(|| CoreError::UnknownState(next.to_string()))?;
        if !from.can_transition_to(to) {
            return Err(CoreError::IllegalTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        Ok(to)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentState {
    Draft,
    InProgress,
    ResponseSubmitted,
    UnderReview,
    Completed,
}

impl AssessmentState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::InProgress => "IN_PROGRESS",
            Self::ResponseSubmitted => "RESPONSE_SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Completed => "COMPLETED",
        }
    }
}

/// Current time in UTC, truncated to whole milliseconds.
#[must_use]
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc().to_offset(UtcOffset::UTC);
    now.replace_nanosecond(u32::from(now.millisecond()) * 1_000_000)
        .unwrap_or(now)
}

/// Next `updatedAt` value: the current time, or one millisecond past
/// `previous` when the clock has not moved beyond it.
#[must_use]
pub fn advance_timestamp(previous: OffsetDateTime) -> OffsetDateTime {
    let now = now_utc();
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

/// Parses an RFC3339 timestamp and normalizes it to UTC.
///
/// # Errors
/// Returns [`CoreError::Timestamp`] when parsing fails.
pub fn parse_rfc3339_utc(value: &str) -> Result<OffsetDateTime, CoreError> {
    OffsetDateTime::parse(value, &time::format_description::well_known::Rfc3339)
        .map(|parsed| parsed.to_offset(UtcOffset::UTC))
        .map_err(|err| CoreError::Timestamp(format!("invalid RFC3339 timestamp: {err}")))
}

/// Formats a timestamp as RFC3339 after normalizing to UTC.
///
/// # Errors
/// Returns [`CoreError::Timestamp`] when formatting fails.
pub fn format_rfc3339(value: OffsetDateTime) -> Result<String, CoreError> {
    value
        .to_offset(UtcOffset::UTC)
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|err| CoreError::Timestamp(format!("failed to format RFC3339 timestamp: {err}")))
}
