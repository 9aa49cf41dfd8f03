pub mod http;
pub mod wire;

use serde_json::json;

use crate::error::ApiError;
use crate::model::Test;
use crate::result::TestResult;
use crate::submission::SubmitPayload;

pub use http::HttpBackend;

/// Remote collaborator that owns question banks, grading and persistence.
///
/// Calls block; the app runs them on worker threads and posts the outcome
/// back into its event channel.
pub trait TestBackend: Send + Sync {
    fn fetch_test(&self, test_id: &str) -> Result<Test, ApiError>;

    /// Returns the result identifier when the backend reports one.
    fn submit_test(
        &self,
        test_id: &str,
        payload: &SubmitPayload,
    ) -> Result<Option<String>, ApiError>;

    fn fetch_result(&self, result_id: &str) -> Result<TestResult, ApiError>;

    /// Returns the identifier of the freshly generated test.
    fn create_test(&self, request: &CreateTestRequest) -> Result<String, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum EducationLevel {
    #[strum(to_string = "undergraduate")]
    Undergraduate,
    #[strum(to_string = "juniorcollege")]
    JuniorCollege,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateTestRequest {
    Gate,
    Company {
        name: String,
    },
    Cet,
    Custom {
        level: EducationLevel,
        minutes: u32,
        questions: u32,
        topics: Vec<String>,
    },
}

impl CreateTestRequest {
    pub fn path(&self) -> String {
        match self {
            CreateTestRequest::Gate => "/test/undergraduate/gate".to_string(),
            CreateTestRequest::Company { .. } => "/test/undergraduate/companySpecific".to_string(),
            CreateTestRequest::Cet => "/test/juniorcollege/cet".to_string(),
            CreateTestRequest::Custom { level, .. } => format!("/test/{level}/custom"),
        }
    }

    pub fn body(&self) -> serde_json::Value {
        match self {
            CreateTestRequest::Gate | CreateTestRequest::Cet => json!({}),
            CreateTestRequest::Company { name } => json!({ "company": name }),
            CreateTestRequest::Custom {
                minutes,
                questions,
                topics,
                ..
            } => json!({
                "time": minutes,
                "numberOfQuestions": questions,
                "topicList": topics,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_paths() {
        assert_eq!(CreateTestRequest::Gate.path(), "/test/undergraduate/gate");
        assert_eq!(CreateTestRequest::Cet.path(), "/test/juniorcollege/cet");
        let custom = CreateTestRequest::Custom {
            level: EducationLevel::JuniorCollege,
            minutes: 30,
            questions: 20,
            topics: vec!["Algebra".into(), "Optics".into()],
        };
        assert_eq!(custom.path(), "/test/juniorcollege/custom");
    }

    #[test]
    fn creation_bodies() {
        let company = CreateTestRequest::Company { name: "Acme".into() };
        assert_eq!(company.body(), json!({ "company": "Acme" }));

        let custom = CreateTestRequest::Custom {
            level: EducationLevel::Undergraduate,
            minutes: 45,
            questions: 10,
            topics: vec!["Graphs".into()],
        };
        assert_eq!(
            custom.body(),
            json!({ "time": 45, "numberOfQuestions": 10, "topicList": ["Graphs"] })
        );
    }
}
