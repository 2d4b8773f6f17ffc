use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{advance_timestamp, format_rfc3339, now_utc, parse_rfc3339_utc, AssessmentState};

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_line1: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: String,
    pub workflow_id: String,
    pub legal_name: String,
    pub trade_name: String,
    pub pan: String,
    pub pan_verified: bool,
    pub gstin: String,
    pub gstin_verified: bool,
    pub entity_type: String,
    pub contact_person_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub registered_address: Address,
    pub category: String,
    /// Not kept in sync with the vendor's due-diligence case.
    pub due_diligence_status: String,
    pub state: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub material: bool,
}

impl Vendor {
    /// Overwrites the lifecycle state and refreshes `updated_at`.
    pub fn set_state(&mut self, state: impl Into<String>) {
        self.state = state.into();
        self.updated_at = advance_timestamp(self.updated_at);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub id: String,
    pub check_type: String,
    pub status: String,
    pub passed: bool,
    pub risk_category: String,
    pub match_score: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DueDiligenceCase {
    pub id: String,
    pub vendor_id: String,
    pub vendor_name: String,
    pub pan: String,
    pub overall_status: String,
    pub checks: Vec<Check>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Reads `field` as a storage key. Strings are used as-is, numbers and
/// booleans by their JSON text; anything else has no key.
#[must_use]
pub fn record_key(map: &Map<String, Value>, field: &str) -> Option<String> {
    match map.get(field)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub(crate) fn timestamp_value(at: OffsetDateTime) -> Value {
    format_rfc3339(at).map_or(Value::Null, Value::String)
}

fn refresh_updated_at(map: &mut Map<String, Value>) {
    let previous = map
        .get("updatedAt")
        .and_then(Value::as_str)
        .and_then(|raw| parse_rfc3339_utc(raw).ok());
    let next = previous.map_or_else(now_utc, advance_timestamp);
    map.insert("updatedAt".to_string(), timestamp_value(next));
}

/// A TPRM assessment. Kept as a JSON object so caller-supplied fields
/// survive verbatim, including ones this crate does not know about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct Assessment(Map<String, Value>);

impl Assessment {
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn id(&self) -> Option<String> {
        record_key(&self.0, "id")
    }

    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.0.get("state").and_then(Value::as_str)
    }

    #[must_use]
    pub fn vendor_id(&self) -> Option<String> {
        record_key(&self.0, "vendorId")
    }

    #[must_use]
    pub fn response_id(&self) -> Option<String> {
        record_key(&self.0, "responseId")
    }

    pub fn mark_response_submitted(&mut self) {
        self.0.insert(
            "state".to_string(),
            Value::String(AssessmentState::ResponseSubmitted.as_str().to_string()),
        );
        refresh_updated_at(&mut self.0);
    }
}

/// A submitted answer set for an [`Assessment`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct AssessmentResponse(Map<String, Value>);

impl AssessmentResponse {
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn id(&self) -> Option<String> {
        record_key(&self.0, "id")
    }

    #[must_use]
    pub fn assessment_id(&self) -> Option<String> {
        record_key(&self.0, "assessmentId")
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}
