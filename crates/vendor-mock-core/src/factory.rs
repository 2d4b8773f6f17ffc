use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};
use time::OffsetDateTime;

use crate::faker;
use crate::records::timestamp_value;
use crate::{
    now_utc, record_key, Address, Assessment, AssessmentResponse, AssessmentState, Check,
    DueDiligenceCase, Vendor, VendorState,
};

const ASSESSMENT_TYPE: &str = "TPRM_A";
const ASSESSMENT_TEMPLATE_ID: &str = "TPRM-A-v1";
const NAME_SCREENING: &str = "NAME_SCREENING";

/// Path segments the assessment routes claim for themselves. An assessment
/// stored under one of these could never be read back by id.
const RESERVED_ASSESSMENT_IDS: &[&str] = &["tprm-a", "responses"];

struct QuestionTemplate {
    id: &'static str,
    text: &'static str,
}

struct SectionTemplate {
    id: &'static str,
    title: &'static str,
    questions: &'static [QuestionTemplate],
}

const TPRM_A_SECTIONS: &[SectionTemplate] = &[
    SectionTemplate {
        id: "SEC-INFOSEC",
        title: "Information Security",
        questions: &[
            QuestionTemplate {
                id: "Q-INFOSEC-1",
                text: "Does the vendor maintain a documented information security policy?",
            },
            QuestionTemplate {
                id: "Q-INFOSEC-2",
                text: "Is customer data encrypted at rest and in transit?",
            },
            QuestionTemplate {
                id: "Q-INFOSEC-3",
                text: "Are access reviews performed at least quarterly?",
            },
        ],
    },
    SectionTemplate {
        id: "SEC-PRIVACY",
        title: "Data Privacy",
        questions: &[
            QuestionTemplate {
                id: "Q-PRIVACY-1",
                text: "Is personal data processed only for contracted purposes?",
            },
            QuestionTemplate {
                id: "Q-PRIVACY-2",
                text: "Does the vendor notify breaches within 72 hours?",
            },
        ],
    },
    SectionTemplate {
        id: "SEC-BCP",
        title: "Business Continuity",
        questions: &[
            QuestionTemplate {
                id: "Q-BCP-1",
                text: "Is there a tested business continuity plan?",
            },
            QuestionTemplate {
                id: "Q-BCP-2",
                text: "Are critical subcontractors identified and assessed?",
            },
        ],
    },
];

const QUESTION_MAX_SCORE: u32 = 10;

/// Answer value and the score it earns.
const ANSWERS: &[(&str, u32)] = &[("YES", 10), ("PARTIAL", 5), ("NO", 0)];

/// Builds fully populated mock records.
///
/// All randomness flows through one seedable generator, so two factories
/// built with the same seed produce the same names, identifiers and scores
/// (timestamps aside).
#[derive(Debug)]
pub struct RecordFactory {
    rng: Mutex<StdRng>,
}

impl Default for RecordFactory {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RecordFactory {
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    #[must_use]
    pub fn from_entropy() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    /// A fresh random UUID, used for vendors that have no caller-chosen id.
    #[must_use]
    pub fn vendor_id(&self) -> String {
        faker::uuid4(&mut *self.rng.lock())
    }

    #[must_use]
    pub fn vendor(&self, id: &str) -> Vendor {
        let now = now_utc();
        let mut rng = self.rng.lock();
        let rng = &mut *rng;
        Vendor {
            id: id.to_string(),
            workflow_id: faker::uuid4(rng),
            legal_name: faker::company(rng),
            trade_name: faker::company_suffix(rng),
            pan: faker::bothify(rng, "?????####?"),
            pan_verified: true,
            gstin: faker::bothify(rng, "##?????####?#?#"),
            gstin_verified: true,
            entity_type: "PROPRIETORSHIP".to_string(),
            contact_person_name: faker::name(rng),
            contact_email: faker::email(rng),
            contact_phone: faker::msisdn(rng),
            registered_address: Address {
                address_line1: faker::street_address(rng),
                city: faker::city(rng),
                state: faker::state(rng),
                pincode: faker::postcode(rng),
                country: "India".to_string(),
            },
            category: "FOS".to_string(),
            due_diligence_status: "NOT_STARTED".to_string(),
            state: VendorState::Draft.as_str().to_string(),
            created_at: now,
            updated_at: now,
            material: true,
        }
    }

    /// A due-diligence case for `vendor` with a single name-screening check.
    #[must_use]
    pub fn due_diligence(&self, vendor: &Vendor) -> DueDiligenceCase {
        let now = now_utc();
        let millis = unix_millis(now);
        let mut rng = self.rng.lock();
        let rng = &mut *rng;

        let match_score = f64::from(rng.gen_range(0_u32..400)) / 10.0;
        let passed = match_score < 30.0;
        let risk_category = if match_score < 15.0 {
            "LOW"
        } else if match_score < 30.0 {
            "MEDIUM"
        } else {
            "HIGH"
        };
        let check = Check {
            id: faker::ulid(rng, millis),
            check_type: NAME_SCREENING.to_string(),
            status: "COMPLETED".to_string(),
            passed,
            risk_category: risk_category.to_string(),
            match_score,
            started_at: now,
            completed_at: Some(now),
            retry_count: 0,
            last_error: None,
        };

        DueDiligenceCase {
            id: faker::ulid(rng, millis),
            vendor_id: vendor.id.clone(),
            vendor_name: vendor.legal_name.clone(),
            pan: vendor.pan.clone(),
            overall_status: if passed { "COMPLETED" } else { "ACTION_REQUIRED" }.to_string(),
            checks: vec![check],
            created_at: now,
            updated_at: now,
        }
    }

    /// An assessment whose fields come from `payload` where present and
    /// from generated defaults otherwise.
    #[must_use]
    pub fn assessment(&self, payload: Map<String, Value>) -> Assessment {
        let now = now_utc();
        let millis = unix_millis(now);
        let mut rng = self.rng.lock();
        let rng = &mut *rng;

        let id = faker::ulid(rng, millis);
        let defaults = json!({
            "id": id,
            "assessmentType": ASSESSMENT_TYPE,
            "templateId": ASSESSMENT_TEMPLATE_ID,
            "vendorId": faker::uuid4(rng),
            "engagementId": faker::uuid4(rng),
            "activityId": faker::uuid4(rng),
            "state": AssessmentState::Draft.as_str(),
            "responseId": faker::ulid(rng, millis),
            "approvals": [],
            "findings": [],
            "actionItems": [],
            "documents": [],
            "createdBy": faker::name(rng),
            "createdAt": timestamp_value(now),
            "updatedAt": timestamp_value(now),
        });

        let mut record = overlay(defaults, payload);
        let addressable = record_key(&record, "id").is_some_and(|key| addressable_id(&key));
        if !addressable {
            record.insert("id".to_string(), Value::String(id));
        }
        Assessment::from_map(record)
    }

    /// A response to `assessment_id`. Fields come from `payload` where
    /// present; `id` and `vendorId` default to the parent's values when
    /// `parent` is known. `updatedAt` is always set to now.
    #[must_use]
    pub fn assessment_response(
        &self,
        assessment_id: &str,
        parent: Option<&Assessment>,
        payload: Map<String, Value>,
    ) -> AssessmentResponse {
        let now = now_utc();
        let millis = unix_millis(now);
        let mut rng = self.rng.lock();
        let rng = &mut *rng;

        let id = parent
            .and_then(Assessment::response_id)
            .unwrap_or_else(|| faker::ulid(rng, millis));
        let vendor_id =
            parent.and_then(Assessment::vendor_id).unwrap_or_else(|| faker::uuid4(rng));
        let (sections, score_result) = generate_answers(rng);
        let defaults = json!({
            "id": id,
            "assessmentId": assessment_id,
            "assessmentType": ASSESSMENT_TYPE,
            "vendorId": vendor_id,
            "status": "SUBMITTED",
            "submittedBy": faker::name(rng),
            "submittedAt": timestamp_value(now),
            "sections": sections,
            "scoreResult": score_result,
            "createdAt": timestamp_value(now),
            "updatedAt": timestamp_value(now),
        });

        let mut record = overlay(defaults, payload);
        if record_key(&record, "id").is_none() {
            record.insert("id".to_string(), Value::String(id));
        }
        record.insert("updatedAt".to_string(), timestamp_value(now));
        AssessmentResponse::from_map(record)
    }
}

fn unix_millis(at: OffsetDateTime) -> u64 {
    u64::try_from(at.unix_timestamp_nanos() / 1_000_000).unwrap_or(0)
}

fn addressable_id(id: &str) -> bool {
    !id.is_empty() && !id.contains('/') && !RESERVED_ASSESSMENT_IDS.contains(&id)
}

fn overlay(defaults: Value, payload: Map<String, Value>) -> Map<String, Value> {
    let mut record = match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in payload {
        record.insert(key, value);
    }
    record
}

/// Random answers for the TPRM-A template and a score summary over them.
fn generate_answers(rng: &mut StdRng) -> (Value, Value) {
    let mut sections = Vec::with_capacity(TPRM_A_SECTIONS.len());
    let mut section_scores = Vec::with_capacity(TPRM_A_SECTIONS.len());
    let mut total = 0_u32;
    let mut max = 0_u32;

    for section in TPRM_A_SECTIONS {
        let mut section_total = 0_u32;
        let questions: Vec<Value> = section
            .questions
            .iter()
            .map(|question| {
                let (answer, score) = ANSWERS[rng.gen_range(0..ANSWERS.len())];
                section_total += score;
                json!({
                    "questionId": question.id,
                    "text": question.text,
                    "answer": {
                        "value": answer,
                        "score": score,
                        "comment": null,
                        "evidence": [],
                    },
                })
            })
            .collect();
        let section_max =
            QUESTION_MAX_SCORE * u32::try_from(section.questions.len()).unwrap_or(u32::MAX);

        sections.push(json!({
            "sectionId": section.id,
            "title": section.title,
            "questions": questions,
        }));
        section_scores.push(json!({
            "sectionId": section.id,
            "score": section_total,
            "maxScore": section_max,
        }));
        total += section_total;
        max += section_max;
    }

    let percentage = if max == 0 {
        0.0
    } else {
        (f64::from(total) * 1000.0 / f64::from(max)).round() / 10.0
    };
    let risk_rating = if percentage >= 80.0 {
        "LOW"
    } else if percentage >= 50.0 {
        "MEDIUM"
    } else {
        "HIGH"
    };

    let score_result = json!({
        "totalScore": total,
        "maxScore": max,
        "percentage": percentage,
        "riskRating": risk_rating,
        "sectionScores": section_scores,
    });
    (Value::Array(sections), score_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_rfc3339_utc;
    use proptest::prelude::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn is_pattern(value: &str, pattern: &str) -> bool {
        value.len() == pattern.len()
            && value.chars().zip(pattern.chars()).all(|(ch, pat)| match pat {
                '?' => ch.is_ascii_uppercase(),
                '#' => ch.is_ascii_digit(),
                other => ch == other,
            })
    }

    #[test]
    fn vendor_defaults_match_onboarding_template() {
        let factory = RecordFactory::seeded(1);
        let vendor = factory.vendor("vendor-42");

        assert_eq!(vendor.id, "vendor-42");
        assert_eq!(vendor.state, "DRAFT");
        assert_eq!(vendor.category, "FOS");
        assert_eq!(vendor.entity_type, "PROPRIETORSHIP");
        assert_eq!(vendor.due_diligence_status, "NOT_STARTED");
        assert_eq!(vendor.registered_address.country, "India");
        assert!(vendor.pan_verified && vendor.gstin_verified && vendor.material);
        assert!(is_pattern(&vendor.pan, "?????####?"), "pan: {}", vendor.pan);
        assert!(is_pattern(&vendor.gstin, "##?????####?#?#"), "gstin: {}", vendor.gstin);
        assert_eq!(vendor.created_at, vendor.updated_at);
    }

    #[test]
    fn seeded_factories_agree_on_generated_fields() {
        let left = RecordFactory::seeded(2026).vendor("v");
        let right = RecordFactory::seeded(2026).vendor("v");
        assert_eq!(left.legal_name, right.legal_name);
        assert_eq!(left.pan, right.pan);
        assert_eq!(left.workflow_id, right.workflow_id);
        assert_eq!(left.registered_address, right.registered_address);
    }

    #[test]
    fn due_diligence_copies_vendor_identity() {
        let factory = RecordFactory::seeded(5);
        let vendor = factory.vendor("v-dd");
        let case = factory.due_diligence(&vendor);

        assert_eq!(case.vendor_id, vendor.id);
        assert_eq!(case.vendor_name, vendor.legal_name);
        assert_eq!(case.pan, vendor.pan);
        assert_eq!(case.checks.len(), 1);
        let check = &case.checks[0];
        assert_eq!(check.check_type, "NAME_SCREENING");
        assert_eq!(check.retry_count, 0);
        assert!(check.last_error.is_none());
        assert_eq!(check.passed, check.match_score < 30.0);
        assert_eq!(case.overall_status == "COMPLETED", check.passed);
    }

    #[test]
    fn assessment_fills_defaults_around_payload() {
        let factory = RecordFactory::seeded(9);
        let assessment = factory.assessment(object(json!({
            "vendorId": "vendor-7",
            "engagementId": "eng-1",
            "priority": "HIGH",
        })));
        let map = assessment.as_map();

        assert_eq!(map["vendorId"], json!("vendor-7"));
        assert_eq!(map["engagementId"], json!("eng-1"));
        assert_eq!(map["priority"], json!("HIGH"));
        assert_eq!(map["state"], json!("DRAFT"));
        assert_eq!(map["assessmentType"], json!("TPRM_A"));
        for empty in ["approvals", "findings", "actionItems", "documents"] {
            assert_eq!(map[empty], json!([]), "{empty} should default to empty");
        }
        assert!(assessment.id().is_some());
        assert!(assessment.response_id().is_some());
    }

    #[test]
    fn assessment_replaces_unusable_id() {
        let factory = RecordFactory::seeded(10);
        let assessment = factory.assessment(object(json!({"id": null})));
        assert!(assessment.id().is_some_and(|id| !id.is_empty()));
    }

    #[test]
    fn assessment_replaces_ids_that_collide_with_routes() {
        let factory = RecordFactory::seeded(11);
        for taken in ["tprm-a", "responses", "a/b", ""] {
            let assessment = factory.assessment(object(json!({"id": taken})));
            let id = assessment.id().unwrap_or_default();
            assert!(addressable_id(&id), "{taken:?} was replaced by {id:?}");
            assert_ne!(id, taken);
        }
        let kept = factory.assessment(object(json!({"id": "asm-tprm-a"})));
        assert_eq!(kept.id().as_deref(), Some("asm-tprm-a"));
    }

    #[test]
    fn response_inherits_parent_ids_and_overwrites_updated_at() {
        let factory = RecordFactory::seeded(12);
        let parent = factory.assessment(object(json!({"id": "asm-1", "vendorId": "ven-1"})));
        let response = factory.assessment_response(
            "asm-1",
            Some(&parent),
            object(json!({"updatedAt": "1999-01-01T00:00:00Z"})),
        );

        assert_eq!(response.id(), parent.response_id());
        assert_eq!(response.assessment_id().as_deref(), Some("asm-1"));
        assert_eq!(response.get("vendorId"), Some(&json!("ven-1")));
        let updated = response
            .get("updatedAt")
            .and_then(Value::as_str)
            .and_then(|raw| parse_rfc3339_utc(raw).ok())
            .unwrap_or_else(|| panic!("updatedAt missing: {response:?}"));
        assert!(updated.year() >= 2024);
    }

    #[test]
    fn score_result_summarises_generated_sections() {
        let factory = RecordFactory::seeded(21);
        let response = factory.assessment_response("asm-x", None, Map::new());
        let score = response.get("scoreResult").cloned().unwrap_or(Value::Null);
        let sections = response.get("sections").and_then(Value::as_array).cloned();

        let Some(sections) = sections else {
            panic!("sections missing: {response:?}");
        };
        assert_eq!(sections.len(), TPRM_A_SECTIONS.len());
        assert_eq!(score["maxScore"], json!(70));
        let section_sum: u64 = score["sectionScores"]
            .as_array()
            .map(|items| items.iter().filter_map(|item| item["score"].as_u64()).sum())
            .unwrap_or_default();
        assert_eq!(score["totalScore"].as_u64(), Some(section_sum));
        assert!(matches!(score["riskRating"].as_str(), Some("LOW" | "MEDIUM" | "HIGH")));
    }

    proptest! {
        #[test]
        fn response_keeps_supplied_fields(
            status in "[A-Z_]{1,12}",
            reviewer in "[a-z]{1,10}",
            score in 0_u32..1000,
        ) {
            let factory = RecordFactory::seeded(u64::from(score));
            let payload = object(json!({
                "status": status,
                "reviewer": reviewer,
                "scoreResult": {"totalScore": score},
            }));
            let response = factory.assessment_response("asm-p", None, payload.clone());
            for (key, value) in &payload {
                prop_assert_eq!(response.get(key), Some(value));
            }
            prop_assert_eq!(response.get("assessmentId"), Some(&json!("asm-p")));
        }
    }
}
