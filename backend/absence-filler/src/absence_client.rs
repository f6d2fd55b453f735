// src/absence_client.rs

use chrono::NaiveDate;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::{FillerConfig, TimespanType, WorkEntryTemplate};
use crate::hawk::{HawkArtifacts, HawkCredentials, HawkError};

const USERS_ENDPOINT: &str = "/api/v2/users";
const ABSENCES_ENDPOINT: &str = "/api/v2/absences";
const TIMESPANS_CREATE_ENDPOINT: &str = "/api/v2/timespans/create";
const JSON_CONTENT_TYPE: &str = "application/json";
const ABSENCE_QUERY_LIMIT: u32 = 50;
const REQUEST_TIMEOUT_SECS: u64 = 30;

// --- Absence.io API Data Structures ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateBound {
    #[serde(rename = "$lte", skip_serializing_if = "Option::is_none")]
    pub lte: Option<String>,
    #[serde(rename = "$gte", skip_serializing_if = "Option::is_none")]
    pub gte: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceFilter {
    pub assigned_to_id: String,
    pub start: DateBound,
    pub end: DateBound,
}

#[derive(Debug, Clone, Serialize)]
pub struct AbsenceQuery {
    pub skip: u32,
    pub limit: u32,
    pub filter: AbsenceFilter,
}

impl AbsenceQuery {
    /// Absences assigned to `user_id` that start on or before and end on or
    /// after midnight of `day`.
    pub fn covering(user_id: &str, day: NaiveDate) -> Self {
        let midnight = format!("{}T00:00:00.000Z", day.format("%Y-%m-%d"));
        Self {
            skip: 0,
            limit: ABSENCE_QUERY_LIMIT,
            filter: AbsenceFilter {
                assigned_to_id: user_id.to_string(),
                start: DateBound {
                    lte: Some(midnight.clone()),
                    gte: None,
                },
                end: DateBound {
                    lte: None,
                    gte: Some(midnight),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceRecord {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub reason_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceListResponse {
    pub count: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub data: Vec<AbsenceRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimespan {
    pub user_id: String,
    pub start: String,
    pub end: String,
    pub timezone_name: String,
    pub timezone: String,
    #[serde(rename = "type")]
    pub type_: TimespanType,
}

impl NewTimespan {
    pub fn for_day(user_id: &str, day: NaiveDate, entry: &WorkEntryTemplate) -> Self {
        let day = day.format("%Y-%m-%d");
        Self {
            user_id: user_id.to_string(),
            start: format!("{}T{}:00.000Z", day, entry.start_hour),
            end: format!("{}T{}:00.000Z", day, entry.end_hour),
            timezone_name: entry.timezone_name.clone(),
            timezone: entry.timezone.clone(),
            type_: entry.timespan_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTimespan {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

// --- Absence Error Type ---
#[derive(Error, Debug)]
pub enum AbsenceError {
    #[error("HTTP request failed")]
    Request(#[from] reqwest::Error),

    #[error("JSON processing error")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error")]
    UrlParse(#[from] url::ParseError),

    #[error("Hawk signing failed")]
    Hawk(#[from] HawkError),

    #[error("Fail connecting to: {url}, with id: {id} (status {status})")]
    Unauthorized {
        url: String,
        id: String,
        status: StatusCode,
    },

    #[error("Rate limit exceeded (Status 429)")]
    RateLimitExceeded,

    #[error("Absence.io API error: Status={status}, Message='{message}'")]
    ApiError { status: StatusCode, message: String },
}

#[derive(Debug, Clone, Deserialize)]
struct AbsenceErrorPayload {
    message: Option<String>,
    error: Option<String>,
}

/// Hawk-signed client for the handful of Absence.io endpoints the filler uses.
#[derive(Clone)]
pub struct AbsenceClient {
    http_client: Client,
    credentials: HawkCredentials,
    base_url: Url,
}

impl AbsenceClient {
    pub fn new(credentials: HawkCredentials, base_url: Url) -> Result<Self, AbsenceError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http_client,
            credentials,
            base_url,
        })
    }

    pub fn from_config(config: &FillerConfig) -> Result<Self, AbsenceError> {
        Self::new(config.credentials.clone(), config.base_url.clone())
    }

    pub fn user_id(&self) -> &str {
        &self.credentials.id
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, AbsenceError> {
        Ok(self.base_url.join(endpoint)?)
    }

    /// Signs and sends one request, returning the raw response.
    async fn send_signed(
        &self,
        method: Method,
        url: &Url,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, AbsenceError> {
        let (content_type, payload) = match &body {
            Some(bytes) => (JSON_CONTENT_TYPE, bytes.as_slice()),
            None => ("", &[][..]),
        };
        let artifacts = HawkArtifacts::for_request(method.as_str(), url, content_type, payload)?;
        let auth_header = artifacts.header(&self.credentials)?;

        let mut request = self
            .http_client
            .request(method, url.clone())
            .header(AUTHORIZATION, auth_header)
            .header(ACCEPT, JSON_CONTENT_TYPE);
        if let Some(bytes) = body {
            request = request.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(bytes);
        }

        debug!("Sending request to URL: {}", url);
        request.send().await.map_err(|e| {
            error!(
                "HTTP execution failed before receiving response (URL: {}): {}",
                url, e
            );
            AbsenceError::Request(e)
        })
    }

    async fn deserialize_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        context_msg: &str,
    ) -> Result<T, AbsenceError> {
        let status = response.status();
        let request_url = response.url().to_string();
        debug!(
            "Received response for '{}' (URL: {}): Status={}",
            context_msg, request_url, status
        );

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error body: {}", e));
            error!(
                "API Error Response: Status={}, Body='{}' for URL: {}",
                status, error_body, request_url
            );

            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Rate limit exceeded for '{}'", context_msg);
                return Err(AbsenceError::RateLimitExceeded);
            }
            let message = match serde_json::from_str::<AbsenceErrorPayload>(&error_body) {
                Ok(AbsenceErrorPayload {
                    message: Some(message),
                    ..
                }) => message,
                Ok(AbsenceErrorPayload {
                    error: Some(error), ..
                }) => error,
                _ => error_body,
            };
            return Err(AbsenceError::ApiError { status, message });
        }

        let bytes = response.bytes().await?;
        match std::str::from_utf8(&bytes) {
            Ok(text) => debug!("Raw response body for '{}': {}", context_msg, text),
            Err(_) => debug!(
                "Raw response body (hex) for '{}': {}",
                context_msg,
                hex::encode(&bytes)
            ),
        }
        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            error!(
                "JSON deserialization failed for '{}' (URL: {}): {}",
                context_msg, request_url, e
            );
            AbsenceError::Json(e)
        })
    }

    /// Checks that the Hawk credentials are accepted by fetching the user
    /// they belong to. Any non-200 answer is reported as `Unauthorized`.
    pub async fn verify_user(&self) -> Result<AbsenceUser, AbsenceError> {
        let url = self.endpoint_url(&format!("{}/{}", USERS_ENDPOINT, self.credentials.id))?;
        let response = self.send_signed(Method::GET, &url, None).await?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(
                "Fail connecting to: {}, with id: {} (status {})",
                self.base_url, self.credentials.id, status
            );
            return Err(AbsenceError::Unauthorized {
                url: self.base_url.to_string(),
                id: self.credentials.id.clone(),
                status,
            });
        }

        let user: AbsenceUser = self.deserialize_response(response, "verify user").await?;
        debug!(
            "Credentials accepted for user {} ({} {})",
            user.id,
            user.first_name.as_deref().unwrap_or(""),
            user.last_name.as_deref().unwrap_or("")
        );
        Ok(user)
    }

    /// Absences of this user that cover `day`.
    pub async fn find_absences(&self, day: NaiveDate) -> Result<AbsenceListResponse, AbsenceError> {
        let url = self.endpoint_url(ABSENCES_ENDPOINT)?;
        let query = AbsenceQuery::covering(&self.credentials.id, day);
        let body = serde_json::to_vec(&query)?;

        let response = self.send_signed(Method::POST, &url, Some(body)).await?;
        let absences: AbsenceListResponse =
            self.deserialize_response(response, "find absences").await?;
        debug!("{}: {} absence(s) found", day, absences.count);
        Ok(absences)
    }

    pub async fn create_timespan(
        &self,
        day: NaiveDate,
        entry: &WorkEntryTemplate,
    ) -> Result<CreatedTimespan, AbsenceError> {
        let url = self.endpoint_url(TIMESPANS_CREATE_ENDPOINT)?;
        let timespan = NewTimespan::for_day(&self.credentials.id, day, entry);
        let body = serde_json::to_vec(&timespan)?;

        let response = self.send_signed(Method::POST, &url, Some(body)).await?;
        let created: CreatedTimespan =
            self.deserialize_response(response, "create timespan").await?;
        info!(
            "{}: timespan {} created ({} - {})",
            day,
            created.id.as_deref().unwrap_or("<unknown id>"),
            timespan.start,
            timespan.end
        );
        Ok(created)
    }
}
