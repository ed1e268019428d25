use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue, REFERER};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, format_api_error};
use crate::models::{
    Contest, DailyData, DailyQuestion, Envelope, GraphQlResponse, Problemset, RatingChange,
    Submission, User,
};

const MAX_BODY: usize = 32 * 1024 * 1024;

const DAILY_QUERY: &str = "\
query questionOfToday {
  activeDailyCodingChallengeQuestion {
    date
    link
    question {
      questionFrontendId
      title
      titleSlug
      difficulty
      content
      acRate
      topicTags { name }
    }
  }
}";

pub struct RawResponse {
    pub status: u16,
    pub body: String,
    pub is_json: bool,
}

#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, String> {
        let http = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .use_rustls_tls()
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self { http })
    }

    async fn read(resp: reqwest::Response) -> Result<RawResponse, ApiError> {
        let status = resp.status().as_u16();
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("application/json"));

        let mut buf = Vec::with_capacity(64 * 1024);
        let mut stream = resp;
        while let Some(chunk) = stream.chunk().await? {
            if buf.len() + chunk.len() > MAX_BODY {
                return Err(ApiError::BodyTooLarge(MAX_BODY));
            }
            buf.extend_from_slice(&chunk);
        }

        let body = String::from_utf8_lossy(&buf).into_owned();
        Ok(RawResponse { status, body, is_json })
    }

    pub async fn get_raw(&self, url: &str, query: &[(&str, String)]) -> Result<RawResponse, ApiError> {
        tracing::debug!(url, ?query, "GET");
        let resp = self.http.get(url).query(query).send().await?;
        Self::read(resp).await
    }

    pub async fn post_json_raw(
        &self,
        url: &str,
        referer: &str,
        body: &serde_json::Value,
    ) -> Result<RawResponse, ApiError> {
        tracing::debug!(url, "POST");
        let mut req = self.http.post(url).json(body);
        if let Ok(v) = HeaderValue::from_str(referer) {
            req = req.header(REFERER, v);
        }
        let resp = req.send().await?;
        Self::read(resp).await
    }
}

/// Unwraps a Codeforces `{"status": ..., "result": ...}` envelope.
///
/// Codeforces answers failed calls with HTTP 400 and a JSON body carrying a
/// `comment`, so the body is inspected before the status code.
pub fn decode_envelope<T: DeserializeOwned>(resp: &RawResponse) -> Result<T, ApiError> {
    if !resp.is_json {
        if resp.status != 200 {
            return Err(ApiError::Upstream {
                status: resp.status,
                message: format_api_error(resp.status, &resp.body),
            });
        }
        return Err(ApiError::NotJson(resp.status));
    }

    let envelope: Envelope<T> = serde_json::from_str(&resp.body)?;
    match (envelope.status.as_str(), envelope.result) {
        ("OK", Some(result)) => Ok(result),
        _ => Err(ApiError::Upstream {
            status: resp.status,
            message: envelope
                .comment
                .unwrap_or_else(|| format!("Codeforces returned status {}", envelope.status)),
        }),
    }
}

pub fn decode_graphql<T: DeserializeOwned>(resp: &RawResponse) -> Result<T, ApiError> {
    if resp.status != 200 {
        return Err(ApiError::Upstream {
            status: resp.status,
            message: format_api_error(resp.status, &resp.body),
        });
    }
    if !resp.is_json {
        return Err(ApiError::NotJson(resp.status));
    }

    let parsed: GraphQlResponse<T> = serde_json::from_str(&resp.body)?;
    if let Some(err) = parsed.errors.into_iter().next() {
        return Err(ApiError::Upstream {
            status: resp.status,
            message: err.message,
        });
    }
    parsed.data.ok_or_else(|| ApiError::Upstream {
        status: resp.status,
        message: "GraphQL response carried no data".into(),
    })
}

#[derive(Clone)]
pub struct CodeforcesClient {
    http: HttpClient,
    base_url: String,
}

impl CodeforcesClient {
    pub fn new(http: HttpClient, base_url: String) -> Self {
        Self { http, base_url }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}/api/{method}", self.base_url);
        let resp = self.http.get_raw(&url, query).await?;
        decode_envelope(&resp)
    }

    pub async fn user_info(&self, handles: &[String]) -> Result<Vec<User>, ApiError> {
        self.call("user.info", &[("handles", handles.join(";"))]).await
    }

    pub async fn user_status(
        &self,
        handle: &str,
        count: Option<u32>,
    ) -> Result<Vec<Submission>, ApiError> {
        let mut query = vec![("handle", handle.to_owned()), ("from", "1".to_owned())];
        if let Some(count) = count {
            query.push(("count", count.to_string()));
        }
        self.call("user.status", &query).await
    }

    pub async fn user_rating(&self, handle: &str) -> Result<Vec<RatingChange>, ApiError> {
        self.call("user.rating", &[("handle", handle.to_owned())]).await
    }

    pub async fn problemset(&self) -> Result<Problemset, ApiError> {
        self.call("problemset.problems", &[]).await
    }

    pub async fn contest_list(&self) -> Result<Vec<Contest>, ApiError> {
        self.call("contest.list", &[("gym", "false".to_owned())]).await
    }
}

#[derive(Clone)]
pub struct LeetCodeClient {
    http: HttpClient,
    base_url: String,
}

impl LeetCodeClient {
    pub fn new(http: HttpClient, base_url: String) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn daily_question(&self) -> Result<Option<DailyQuestion>, ApiError> {
        let url = format!("{}/graphql", self.base_url);
        let body = serde_json::json!({
            "operationName": "questionOfToday",
            "query": DAILY_QUERY,
            "variables": {},
        });
        let resp = self.http.post_json_raw(&url, &self.base_url, &body).await?;
        let data: DailyData = decode_graphql(&resp)?;
        Ok(data.active_daily_coding_challenge_question)
    }
}
