use crate::{
    data::{HttpMethod, Request, RequestData},
    http_client::HttpClient,
    parameters,
    report::{ReplayOutcome, ReplayReport, ReportSink},
};
use chrono::Local;
use std::{sync::Arc, time::Instant};
use tracing::warn;

/// Replays single requests through an [`HttpClient`] and hands a report of each one to a
/// [`ReportSink`]. Failures never leave the executor.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    http_client: Arc<dyn HttpClient + Send + Sync>,
    report_sink: Arc<dyn ReportSink + Send + Sync>,
    user_agent: String,
}

impl RequestExecutor {
    pub fn new<S: Into<String>>(
        http_client: Arc<dyn HttpClient + Send + Sync>,
        report_sink: Arc<dyn ReportSink + Send + Sync>,
        user_agent: S,
    ) -> Self {
        Self {
            http_client,
            report_sink,
            user_agent: user_agent.into(),
        }
    }

    pub async fn execute(&self, request: &Request) -> ReplayReport {
        let request_data = self.request_data(request);

        let started_at = Local::now();
        let start = Instant::now();
        let outcome = match self.http_client.make_request(&request_data).await {
            Ok(response) => ReplayOutcome::Completed {
                status_code: response.status_code,
            },
            Err(e) => {
                warn!("Failed to perform request {} {}: {}", request.method, request_data.url, e);
                ReplayOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        let elapsed_ms = start.elapsed().as_millis();
        let completed_at = Local::now();

        let report = ReplayReport {
            method: request.method,
            uri: request.uri.clone(),
            host: request.host.clone(),
            timestamp: request.timestamp,
            format: request.format,
            parameters: request.parameters.clone(),
            started_at,
            completed_at,
            elapsed_ms,
            outcome,
        };
        self.report_sink.report(&report);

        report
    }

    /// GET requests carry the parameters in the query string, POST requests in a form body.
    pub fn request_data(&self, request: &Request) -> RequestData {
        let data = parameters::url_encode(&request.parameters);
        let mut headers = vec![
            ("Accept".to_string(), request.format.accept_header().to_string()),
            ("User-Agent".to_string(), self.user_agent.clone()),
        ];

        let (url, body) = match request.method {
            HttpMethod::Get => {
                let mut url = base_url(&request.host, &request.uri);
                if !data.is_empty() {
                    url.push(if request.uri.contains('?') { '&' } else { '?' });
                    url.push_str(&data);
                }
                (url, None)
            }
            HttpMethod::Post => {
                headers.push((
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                ));
                (base_url(&request.host, &request.uri), Some(data))
            }
        };

        RequestData {
            url,
            method: request.method,
            headers,
            body,
        }
    }
}

fn base_url(host: &str, uri: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        format!("{}{}", host, uri)
    } else {
        format!("http://{}{}", host, uri)
    }
}
