use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, Url};

use super::wire;
use super::{CreateTestRequest, TestBackend};
use crate::config::{Config, MAX_SUBMIT_RETRIES};
use crate::error::ApiError;
use crate::model::Test;
use crate::result::TestResult;
use crate::submission::SubmitPayload;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `unit * 2^attempt`, saturating instead of overflowing.
fn backoff_delay(unit: Duration, attempt: u32) -> Duration {
    2_u32
        .checked_pow(attempt)
        .and_then(|factor| unit.checked_mul(factor))
        .unwrap_or(Duration::MAX)
}

/// `TestBackend` over the REST API, using a blocking reqwest client.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
    submit_retries: u32,
    backoff_unit: Duration,
}

impl HttpBackend {
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.backend_url.trim_end_matches('/'))
            .map_err(|err| ApiError::Network(format!("invalid backend url: {err}")))?;

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone().filter(|t| !t.is_empty()),
            submit_retries: config.submit_retries.min(MAX_SUBMIT_RETRIES),
            backoff_unit: Duration::from_secs(1),
        })
    }

    /// Scale the retry backoff; tests shrink it to keep runs fast.
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.endpoint(path));
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn execute(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder
            .send()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| ApiError::Network(err.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: wire::extract_error_message(&body),
            });
        }
        Ok(body)
    }
}

impl TestBackend for HttpBackend {
    fn fetch_test(&self, test_id: &str) -> Result<Test, ApiError> {
        let path = format!("/test/{test_id}");
        tracing::debug!(%path, "fetching test");
        let body = self.execute(self.request(Method::GET, &path))?;
        wire::decode_test(&body, test_id)
    }

    fn submit_test(
        &self,
        test_id: &str,
        payload: &SubmitPayload,
    ) -> Result<Option<String>, ApiError> {
        let path = format!("/test/{test_id}/submit");
        let mut last_error = None;

        for attempt in 0..=self.submit_retries {
            tracing::debug!(%path, attempt, "submitting test");
            match self.execute(self.request(Method::PATCH, &path).json(payload)) {
                Ok(body) => return Ok(wire::decode_submit_receipt(&body)),
                Err(err) if err.is_retryable() => {
                    tracing::warn!(attempt, error = %err, "submit attempt failed");
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }

            if attempt < self.submit_retries {
                std::thread::sleep(backoff_delay(self.backoff_unit, attempt));
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::Network("submit was not attempted".into())))
    }

    fn fetch_result(&self, result_id: &str) -> Result<TestResult, ApiError> {
        let path = format!("/test/{result_id}/result");
        tracing::debug!(%path, "fetching result");
        let body = self.execute(self.request(Method::GET, &path))?;
        wire::decode_result(&body)
    }

    fn create_test(&self, request: &CreateTestRequest) -> Result<String, ApiError> {
        let path = request.path();
        tracing::debug!(%path, "creating test");
        let body = self.execute(self.request(Method::POST, &path).json(&request.body()))?;
        wire::decode_created_test_id(&body)
    }
}
