use std::future::Future;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client as HttpClient, Response};
use serde::Deserialize;
use tracing::{debug, info};

use super::{Config, ConfigError, Diagnostic, FailureCause};
use crate::domain::CountSubmission;

/// Status codes the accounting API answers with on success.
pub const ACCEPTED_STATUS: [u16; 3] = [200, 201, 204];

/// Record created by a successful count submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRecord {
    pub url: String,
}

/// The two calls the submission workflow needs from the accounting API.
pub trait CountingApi {
    /// POST the counted amounts. Resolves to the created record.
    fn submit_count(
        &self,
        submission: &CountSubmission,
    ) -> impl Future<Output = Result<CreatedRecord, Diagnostic>> + Send;

    /// GET the print trigger for a record.
    fn trigger_print(
        &self,
        print_url: &str,
        printer: Option<&str>,
    ) -> impl Future<Output = Result<(), Diagnostic>> + Send;
}

/// `CountingApi` over HTTP with token authentication.
#[derive(Debug, Clone)]
pub struct HttpCountingApi {
    http_client: HttpClient,
    counting_url: String,
    access_token: String,
}

#[derive(Deserialize)]
struct RecordResponse {
    url: Option<String>,
}

impl HttpCountingApi {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http_client,
            counting_url: config.counting_url(),
            access_token: config.access_token.clone(),
        })
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.access_token)
    }
}

impl CountingApi for HttpCountingApi {
    async fn submit_count(
        &self,
        submission: &CountSubmission,
    ) -> Result<CreatedRecord, Diagnostic> {
        let payload = serde_json::to_value(submission).ok();
        let failure = |status: Option<u16>, body: String, cause: FailureCause| Diagnostic {
            url: self.counting_url.clone(),
            payload: payload.clone(),
            status,
            body,
            cause,
        };

        debug!(url = %self.counting_url, "submitting count");
        let response = self
            .http_client
            .post(&self.counting_url)
            .header(AUTHORIZATION, self.auth_header())
            .json(submission)
            .send()
            .await
            .map_err(|e| failure(None, String::new(), FailureCause::Transport(e.to_string())))?;

        let (status, body) = read_response(response).await.map_err(|(status, e)| {
            failure(Some(status), String::new(), FailureCause::Transport(e))
        })?;
        if !ACCEPTED_STATUS.contains(&status) {
            return Err(failure(Some(status), body, FailureCause::UnexpectedStatus));
        }

        let url = serde_json::from_str::<RecordResponse>(&body)
            .ok()
            .and_then(|record| record.url)
            .filter(|url| !url.is_empty());
        match url {
            Some(url) => {
                info!(status, record_url = %url, "count recorded");
                Ok(CreatedRecord { url })
            }
            None => Err(failure(
                Some(status),
                body,
                FailureCause::MalformedResponse("response has no 'url' field".into()),
            )),
        }
    }

    async fn trigger_print(
        &self,
        print_url: &str,
        printer: Option<&str>,
    ) -> Result<(), Diagnostic> {
        let failure = |status: Option<u16>, body: String, cause: FailureCause| Diagnostic {
            url: print_url.to_string(),
            payload: None,
            status,
            body,
            cause,
        };

        debug!(url = %print_url, printer, "triggering print");
        let mut request = self
            .http_client
            .get(print_url)
            .header(AUTHORIZATION, self.auth_header());
        if let Some(printer) = printer {
            request = request.query(&[("printer", printer)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| failure(None, String::new(), FailureCause::Transport(e.to_string())))?;

        let (status, body) = read_response(response).await.map_err(|(status, e)| {
            failure(Some(status), String::new(), FailureCause::Transport(e))
        })?;
        if !ACCEPTED_STATUS.contains(&status) {
            return Err(failure(Some(status), body, FailureCause::UnexpectedStatus));
        }

        info!(status, "print triggered");
        Ok(())
    }
}

async fn read_response(response: Response) -> Result<(u16, String), (u16, String)> {
    let status = response.status().as_u16();
    response
        .text()
        .await
        .map(|body| (status, body))
        .map_err(|e| (status, e.to_string()))
}
