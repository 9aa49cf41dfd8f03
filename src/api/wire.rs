//! JSON shapes exchanged with the backend and their conversion into the
//! session's reference data.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::model::{detect_content, Question, QuestionContent, QuestionId, Section, Test};
use crate::result::{compute_score, QuestionAnalysis, SectionResult, TestResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTest {
    pub id: Option<String>,
    #[serde(rename = "_id")]
    pub mongo_id: Option<String>,
    pub test_name: String,
    /// Minutes.
    #[serde(default)]
    pub total_duration: f64,
    pub total_questions: Option<u32>,
    pub proctoring_enabled: Option<bool>,
    pub sections: Vec<WireSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSection {
    pub section_name: String,
    /// Minutes.
    #[serde(default)]
    pub section_duration: f64,
    #[serde(default)]
    pub questions: Vec<WireQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQuestion {
    pub id: Option<String>,
    #[serde(rename = "_id")]
    pub mongo_id: Option<String>,
    #[serde(default)]
    pub question_text: String,
    pub image_url: Option<String>,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSectionResult {
    pub section_name: String,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub correct_answers: u32,
    #[serde(default)]
    pub time_spent: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQuestionAnalysis {
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_option: i64,
    pub selected_option: i64,
    pub is_correct: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireResult {
    pub id: Option<String>,
    #[serde(rename = "_id")]
    pub mongo_id: Option<String>,
    pub total_questions: u32,
    pub correct_answers: u32,
    #[serde(default)]
    pub time_spent: u64,
    pub invalid: Option<bool>,
    pub tab_switches: Option<u32>,
    pub auto_submitted: Option<bool>,
    pub section_results: Option<Vec<WireSectionResult>>,
    pub question_analysis: Option<Vec<WireQuestionAnalysis>>,
}

fn minutes_to_secs(minutes: f64) -> u64 {
    if minutes.is_finite() && minutes > 0.0 {
        (minutes * 60.0).round() as u64
    } else {
        0
    }
}

/// Responses are sometimes wrapped as `{ "data": ... }`.
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn parse_json(body: &str) -> Result<Value, ApiError> {
    serde_json::from_str(body).map_err(|err| ApiError::Malformed(err.to_string()))
}

/// Pull `message` (or `detail`) out of an error body.
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("detail"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

pub fn decode_test(body: &str, fallback_id: &str) -> Result<Test, ApiError> {
    let data = unwrap_data(parse_json(body)?);
    let raw = data
        .get("test")
        .cloned()
        .ok_or_else(|| ApiError::Malformed("response has no test".to_string()))?;
    let wire: WireTest =
        serde_json::from_value(raw).map_err(|err| ApiError::Malformed(err.to_string()))?;
    normalize_test(wire, fallback_id)
}

pub fn normalize_test(wire: WireTest, fallback_id: &str) -> Result<Test, ApiError> {
    let test_id = wire
        .id
        .or(wire.mongo_id)
        .unwrap_or_else(|| fallback_id.to_string());

    if wire.sections.is_empty() {
        return Err(ApiError::Malformed("test has no sections".to_string()));
    }

    let mut seen = HashSet::new();
    let mut sections = Vec::with_capacity(wire.sections.len());

    for (s_idx, section) in wire.sections.into_iter().enumerate() {
        let mut questions = Vec::with_capacity(section.questions.len());
        for (q_idx, q) in section.questions.into_iter().enumerate() {
            let id = q
                .id
                .or(q.mongo_id)
                .unwrap_or_else(|| format!("{test_id}-q-{}-{}", s_idx + 1, q_idx + 1));
            if !seen.insert(id.clone()) {
                return Err(ApiError::Malformed(format!("duplicate question id {id}")));
            }

            let content = match q.image_url.filter(|url| !url.trim().is_empty()) {
                Some(url) => QuestionContent::Image {
                    url,
                    alt: q.question_text,
                },
                None => detect_content(&q.question_text),
            };

            questions.push(Question {
                id: QuestionId::new(id),
                content,
                options: q.options,
            });
        }

        sections.push(Section {
            id: format!("{test_id}-section-{}", s_idx + 1),
            name: section.section_name,
            duration_secs: minutes_to_secs(section.section_duration),
            questions,
        });
    }

    if let Some(expected) = wire.total_questions {
        let actual: usize = sections.iter().map(|s| s.questions.len()).sum();
        if expected as usize != actual {
            tracing::warn!(expected, actual, "totalQuestions disagrees with section contents");
        }
    }

    Ok(Test {
        id: test_id,
        name: wire.test_name,
        total_duration_secs: minutes_to_secs(wire.total_duration),
        sections,
        proctoring_enabled: wire.proctoring_enabled.unwrap_or(true),
    })
}

/// Result identifier from a submit response; `None` when the backend omits it.
pub fn decode_submit_receipt(body: &str) -> Option<String> {
    let data = unwrap_data(parse_json(body).ok()?);
    let result = data.get("testResult").unwrap_or(&data);
    result
        .get("id")
        .or_else(|| result.get("_id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn decode_result(body: &str) -> Result<TestResult, ApiError> {
    let mut data = unwrap_data(parse_json(body)?);
    if let Some(inner) = data.get_mut("testResult").map(Value::take) {
        data = inner;
    }
    let wire: WireResult =
        serde_json::from_value(data).map_err(|err| ApiError::Malformed(err.to_string()))?;
    Ok(wire.into())
}

impl From<WireResult> for TestResult {
    fn from(raw: WireResult) -> Self {
        let sections = raw
            .section_results
            .unwrap_or_default()
            .into_iter()
            .map(|s| SectionResult {
                score: compute_score(s.correct_answers, s.total_questions),
                name: s.section_name,
                total_questions: s.total_questions,
                correct_answers: s.correct_answers,
                time_spent: s.time_spent,
            })
            .collect();

        let questions = raw
            .question_analysis
            .unwrap_or_default()
            .into_iter()
            .map(|q| QuestionAnalysis {
                question_text: q.question_text,
                options: q.options,
                correct_option: q.correct_option,
                selected_option: q.selected_option,
                is_correct: q.is_correct,
            })
            .collect();

        TestResult {
            id: raw.id.or(raw.mongo_id).unwrap_or_default(),
            total_questions: raw.total_questions,
            correct_answers: raw.correct_answers,
            time_spent: raw.time_spent,
            invalid: raw.invalid.unwrap_or(false),
            tab_switches: raw.tab_switches.unwrap_or(0),
            auto_submitted: raw.auto_submitted.unwrap_or(false),
            sections,
            questions,
        }
    }
}

/// Test identifier from a creation response: `testId` or `data.testDetails.testId`.
pub fn decode_created_test_id(body: &str) -> Result<String, ApiError> {
    let root = parse_json(body)?;
    let id = root
        .get("testId")
        .or_else(|| root.pointer("/data/testDetails/testId"))
        .or_else(|| root.pointer("/data/testId"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty());

    id.map(str::to_string)
        .ok_or_else(|| ApiError::Malformed("creation response has no test id".to_string()))
}
