use crate::{
    error::Error,
    http_client::{HttpClient, HyperHttpClient},
    report::{ReportSink, StdoutReportSink},
};
use std::{sync::Arc, time::Duration};

pub const MAX_REDIRECTS: usize = 5;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

pub const ANDROID_USER_AGENT: &str = "Mozilla/5.0 (Linux; U; Android 2.1; en-us; Nexus One Build/ERD62) AppleWebKit/530.17 (KHTML, like Gecko) Version/4.0 Mobile Safari/530.17";
pub const IPHONE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; U; CPU like Mac OS X; en) AppleWebKit/420+ (KHTML, like Gecko) Version/3.0 Mobile/1A543a Safari/419.3";

#[derive(Debug, Clone)]
pub struct ReplayConfiguration {
    host: String,
    concurrency: usize,
    speed: f64,
    offset: usize,
    count: Option<usize>,
    user_agent: String,
    http_client: Option<Arc<dyn HttpClient + Send + Sync>>,
    report_sink: Option<Arc<dyn ReportSink + Send + Sync>>,
}

impl ReplayConfiguration {
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            concurrency: 1,
            speed: 1.0,
            offset: 0,
            count: None,
            user_agent: ANDROID_USER_AGENT.into(),
            http_client: None,
            report_sink: None,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.host.trim().is_empty() {
            return Err(Error::MissingHost);
        }
        validate_replay_limits(self.concurrency, self.speed)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn set_host<S: Into<String>>(&mut self, host: S) {
        self.host = host.into();
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn set_concurrency(&mut self, concurrency: usize) {
        self.concurrency = concurrency;
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// How many log blocks to read after the offset, `None` reads them all.
    pub fn count(&self) -> Option<usize> {
        self.count
    }

    pub fn set_count(&mut self, count: Option<usize>) {
        self.count = count;
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn set_user_agent<S: Into<String>>(&mut self, user_agent: S) {
        self.user_agent = user_agent.into();
    }

    pub fn http_client(&self) -> Arc<dyn HttpClient + Send + Sync> {
        self.http_client
            .clone()
            .unwrap_or_else(|| Arc::new(HyperHttpClient::new()))
    }

    pub fn set_http_client(&mut self, http_client: Arc<dyn HttpClient + Send + Sync>) {
        self.http_client = Some(http_client);
    }

    pub fn report_sink(&self) -> Arc<dyn ReportSink + Send + Sync> {
        self.report_sink
            .clone()
            .unwrap_or_else(|| Arc::new(StdoutReportSink::new()))
    }

    pub fn set_report_sink(&mut self, report_sink: Arc<dyn ReportSink + Send + Sync>) {
        self.report_sink = Some(report_sink);
    }
}

pub(crate) fn validate_replay_limits(concurrency: usize, speed: f64) -> Result<(), Error> {
    if concurrency == 0 {
        return Err(Error::InvalidConcurrency);
    }
    if !speed.is_finite() || speed <= 0.0 {
        return Err(Error::InvalidSpeed(speed));
    }

    Ok(())
}
