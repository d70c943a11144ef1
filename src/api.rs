//! Client for the backend API.
//!
//! Every call goes to one base URL. Reads are `GET <base>?action=<name>&...`,
//! writes are `POST <base>` with a JSON body carrying `action` next to the
//! payload fields.

use crate::models::{
    ActivityStatusResponse, AddStudentResponse, CalendarMonth, MonthFailure, NewStudent,
    StatisticsResponse,
};
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_ERROR_BODY_LENGTH: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl ApiError {
    fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let body = if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated)", &body[..end])
        };
        ApiError::Status {
            status: status.as_u16(),
            body,
        }
    }
}

/// Cheap to clone; the inner reqwest client shares its connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!(action, "api get");
        let mut query: Vec<(&str, &str)> = vec![("action", action)];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        let response = self.client.get(&self.base_url).query(&query).send().await?;
        Self::decode(response).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        debug!(action, "api post");
        let value = serde_json::to_value(body)
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))?;
        let payload = match value {
            Value::Object(mut object) => {
                object.insert("action".to_string(), Value::String(action.to_string()));
                Value::Object(object)
            }
            other => serde_json::json!({ "action": action, "data": other }),
        };

        let response = self.client.post(&self.base_url).json(&payload).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }
        serde_json::from_str(&body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }

    pub async fn calendar_month(&self, year: i32, month: u32) -> Result<CalendarMonth, ApiError> {
        self.get(
            "calendarMonth",
            &[("year", year.to_string()), ("month", month.to_string())],
        )
        .await
    }

    /// Fetches each month in turn; failed months are collected, not fatal.
    pub async fn calendar_months(
        &self,
        months: &[(i32, u32)],
    ) -> (Vec<CalendarMonth>, Vec<MonthFailure>) {
        let mut fetched = Vec::with_capacity(months.len());
        let mut failures = Vec::new();
        for &(year, month) in months {
            match self.calendar_month(year, month).await {
                Ok(data) => fetched.push(data),
                Err(err) => {
                    warn!(year, month, error = %err, "failed to fetch calendar month");
                    failures.push(MonthFailure {
                        year,
                        month,
                        error: err.to_string(),
                    });
                }
            }
        }
        (fetched, failures)
    }

    pub async fn activity_status(&self, center_id: &str) -> Result<ActivityStatusResponse, ApiError> {
        let data: ActivityStatusResponse = self
            .get("activityStatus", &[("center_id", center_id.to_string())])
            .await?;
        if data.status.as_deref() == Some("error") {
            return Err(ApiError::Backend(
                data.message.unwrap_or_else(|| "activityStatus failed".to_string()),
            ));
        }
        Ok(data)
    }

    pub async fn statistics(&self, center_id: &str) -> Result<StatisticsResponse, ApiError> {
        self.get("statistics", &[("center_id", center_id.to_string())])
            .await
    }

    pub async fn add_student(&self, student: &NewStudent) -> Result<AddStudentResponse, ApiError> {
        self.post("addStudent", student).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(1000);
        match ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, &body) {
            ApiError::Status { status, body } => {
                assert_eq!(status, 502);
                assert!(body.ends_with("... (truncated)"));
                assert!(body.len() < 400);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
