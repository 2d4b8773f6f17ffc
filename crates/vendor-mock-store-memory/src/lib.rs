//! In-memory repository for the vendor onboarding mock.
//!
//! One table per entity type. Records are created lazily on first access,
//! mutated in place, and never evicted.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vendor_mock_core::{
    Assessment, AssessmentResponse, CoreError, DueDiligenceCase, RecordFactory, Vendor,
    VendorState,
};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum StoreError {
    #[error("Assessment not found")]
    AssessmentNotFound(String),
    #[error("Assessment response not found")]
    AssessmentResponseNotFound(String),
    #[error(transparent)]
    Lifecycle(#[from] CoreError),
}

/// How vendor state updates are checked.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any value is written as-is.
    #[default]
    Permissive,
    /// Only edges of the [`VendorState`] lifecycle are accepted.
    Strict,
}

impl TransitionPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::Strict => "strict",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "permissive" => Some(Self::Permissive),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// What a response submission does when its assessment does not exist.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MissingParentPolicy {
    /// Fail with [`StoreError::AssessmentNotFound`] and store nothing.
    #[default]
    Reject,
    /// Store the response anyway; no assessment is touched.
    Lenient,
}

impl MissingParentPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Lenient => "lenient",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "reject" => Some(Self::Reject),
            "lenient" => Some(Self::Lenient),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RepositoryConfig {
    pub seed: Option<u64>,
    pub transition_policy: TransitionPolicy,
    pub missing_parent_policy: MissingParentPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordCounts {
    pub vendors: usize,
    pub due_diligence_cases: usize,
    pub assessments: usize,
    pub assessment_responses: usize,
}

#[derive(Debug)]
struct Table<T> {
    name: &'static str,
    rows: RwLock<HashMap<String, T>>,
}

impl<T: Clone> Table<T> {
    fn new(name: &'static str) -> Self {
        Self { name, rows: RwLock::new(HashMap::new()) }
    }

    fn get(&self, id: &str) -> Option<T> {
        self.rows.read().get(id).cloned()
    }

    /// Returns the row for `id`, building and inserting it under the write
    /// lock when absent. `make` runs at most once per id.
    fn get_or_create(&self, id: &str, make: impl FnOnce() -> T) -> T {
        if let Some(existing) = self.rows.read().get(id) {
            tracing::debug!(table = self.name, id, "record hit");
            return existing.clone();
        }

        let mut rows = self.rows.write();
        if let Some(existing) = rows.get(id) {
            return existing.clone();
        }
        let created = make();
        rows.insert(id.to_string(), created.clone());
        tracing::info!(table = self.name, id, "record created");
        created
    }

    fn insert(&self, id: String, row: T) {
        let replaced = self.rows.write().insert(id.clone(), row).is_some();
        tracing::info!(table = self.name, id = %id, replaced, "record stored");
    }

    fn update<R>(&self, id: &str, apply: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.rows.write().get_mut(id).map(apply)
    }

    fn len(&self) -> usize {
        self.rows.read().len()
    }
}

/// Owns every entity table and the factory that fills them.
#[derive(Debug)]
pub struct Repository {
    factory: RecordFactory,
    config: RepositoryConfig,
    vendors: Table<Vendor>,
    due_diligence: Table<DueDiligenceCase>,
    assessments: Table<Assessment>,
    responses: Table<AssessmentResponse>,
}

impl Default for Repository {
    fn default() -> Self {
        Self::new(RepositoryConfig::default())
    }
}

impl Repository {
    #[must_use]
    pub fn new(config: RepositoryConfig) -> Self {
        Self {
            factory: RecordFactory::new(config.seed),
            config,
            vendors: Table::new("vendors"),
            due_diligence: Table::new("due_diligence"),
            assessments: Table::new("assessments"),
            responses: Table::new("assessment_responses"),
        }
    }

    #[must_use]
    pub fn config(&self) -> RepositoryConfig {
        self.config
    }

    #[must_use]
    pub fn counts(&self) -> RecordCounts {
        RecordCounts {
            vendors: self.vendors.len(),
            due_diligence_cases: self.due_diligence.len(),
            assessments: self.assessments.len(),
            assessment_responses: self.responses.len(),
        }
    }

    #[must_use]
    pub fn vendor(&self, id: &str) -> Option<Vendor> {
        self.vendors.get(id)
    }

    /// The vendor stored under `id`, generating one on first reference.
    #[must_use]
    pub fn vendor_or_create(&self, id: &str) -> Vendor {
        self.vendors.get_or_create(id, || self.factory.vendor(id))
    }

    /// Generates `count` new vendors in `state`. They are stored, so later
    /// reads by id return the same records.
    #[must_use]
    pub fn vendors_in_state(&self, state: &str, count: usize) -> Vec<Vendor> {
        (0..count)
            .map(|_| {
                let mut vendor = self.factory.vendor(&self.factory.vendor_id());
                vendor.state = state.to_string();
                self.vendors.insert(vendor.id.clone(), vendor.clone());
                vendor
            })
            .collect()
    }

    /// Applies the `state` key of `payload` to the vendor, creating the
    /// vendor first if needed. A payload without `state` leaves the record
    /// untouched.
    ///
    /// # Errors
    /// Under [`TransitionPolicy::Strict`], returns [`StoreError::Lifecycle`]
    /// for unknown states and illegal moves. The vendor still exists
    /// afterwards, unchanged.
    pub fn update_vendor_state(
        &self,
        id: &str,
        payload: &Map<String, Value>,
    ) -> Result<Vendor, StoreError> {
        let current = self.vendor_or_create(id);
        let Some(requested) = payload.get("state") else {
            return Ok(current);
        };
        let next = match (self.config.transition_policy, requested) {
            (_, Value::String(value)) => value.clone(),
            (TransitionPolicy::Permissive, other) => other.to_string(),
            (TransitionPolicy::Strict, other) => {
                return Err(CoreError::UnknownState(other.to_string()).into());
            }
        };

        let policy = self.config.transition_policy;
        let updated = self
            .vendors
            .update(id, |vendor| -> Result<Vendor, StoreError> {
                if policy == TransitionPolicy::Strict {
                    if vendor.state == next {
                        return Ok(vendor.clone());
                    }
                    VendorState::validate_transition(&vendor.state, &next)?;
                }
                let previous = std::mem::take(&mut vendor.state);
                vendor.set_state(next.clone());
                tracing::info!(
                    vendor_id = %vendor.id,
                    from = %previous,
                    to = %vendor.state,
                    "vendor state changed"
                );
                Ok(vendor.clone())
            })
            .unwrap_or(Ok(current));

        if let Err(err) = &updated {
            tracing::warn!(vendor_id = id, error = %err, "vendor state change rejected");
        }
        updated
    }

    /// The due-diligence case for `vendor_id`, materializing the vendor and
    /// the case on first access.
    #[must_use]
    pub fn due_diligence_for_vendor(&self, vendor_id: &str) -> DueDiligenceCase {
        let vendor = self.vendor_or_create(vendor_id);
        self.due_diligence.get_or_create(vendor_id, || self.factory.due_diligence(&vendor))
    }

    /// Stores a new assessment built from `payload`. An existing assessment
    /// with the same id is replaced.
    #[must_use]
    pub fn create_assessment(&self, payload: Map<String, Value>) -> Assessment {
        let assessment = self.factory.assessment(payload);
        let id = assessment.id().unwrap_or_default();
        self.assessments.insert(id, assessment.clone());
        assessment
    }

    #[must_use]
    pub fn assessment(&self, id: &str) -> Option<Assessment> {
        self.assessments.get(id)
    }

    /// Stores a response for `assessment_id` and, when that assessment
    /// exists, moves it to `RESPONSE_SUBMITTED`.
    ///
    /// # Errors
    /// Returns [`StoreError::AssessmentNotFound`] when the assessment is
    /// missing and the policy is [`MissingParentPolicy::Reject`].
    pub fn submit_response(
        &self,
        assessment_id: &str,
        payload: Map<String, Value>,
    ) -> Result<AssessmentResponse, StoreError> {
        let parent = self.assessments.get(assessment_id);
        if parent.is_none() && self.config.missing_parent_policy == MissingParentPolicy::Reject {
            tracing::warn!(assessment_id, "response rejected: assessment not found");
            return Err(StoreError::AssessmentNotFound(assessment_id.to_string()));
        }

        let response = self.factory.assessment_response(assessment_id, parent.as_ref(), payload);
        self.responses.insert(response.id().unwrap_or_default(), response.clone());

        if parent.is_some() {
            self.assessments.update(assessment_id, Assessment::mark_response_submitted);
            tracing::info!(assessment_id, "assessment marked RESPONSE_SUBMITTED");
        }
        Ok(response)
    }

    /// # Errors
    /// Returns [`StoreError::AssessmentResponseNotFound`] for unknown ids.
    pub fn assessment_response(&self, id: &str) -> Result<AssessmentResponse, StoreError> {
        self.responses
            .get(id)
            .ok_or_else(|| StoreError::AssessmentResponseNotFound(id.to_string()))
    }
}
