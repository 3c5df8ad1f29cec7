use crate::{
    configuration::ReplayConfiguration,
    data::Request,
    error::Error,
    executor::RequestExecutor,
    log_blocks, log_parser,
    scheduler::{ReplayRun, ReplayScheduler},
};
use std::path::Path;

/// Reads captured requests from a Rails log and replays them against the configured host.
#[derive(Debug)]
pub struct RequestLogReplayer {
    configuration: ReplayConfiguration,
    scheduler: ReplayScheduler,
}

impl RequestLogReplayer {
    pub fn new(configuration: ReplayConfiguration) -> Result<Self, Error> {
        configuration.validate()?;

        let executor = RequestExecutor::new(
            configuration.http_client(),
            configuration.report_sink(),
            configuration.user_agent(),
        );

        Ok(Self {
            scheduler: ReplayScheduler::new(executor),
            configuration,
        })
    }

    pub fn configuration(&self) -> &ReplayConfiguration {
        &self.configuration
    }

    /// Reads the configured window of blocks from a log file.
    pub fn load_blocks<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<String>, Error> {
        log_blocks::load_blocks(
            log_path,
            self.configuration.offset(),
            self.configuration.count(),
        )
    }

    pub fn parse_log<S: AsRef<str>>(&self, blocks: &[S]) -> Result<Vec<Request>, Error> {
        log_parser::parse(blocks, self.configuration.host())
    }

    pub fn replay_requests(&self, requests: &[Request]) -> Result<ReplayRun, Error> {
        self.scheduler.schedule(
            requests,
            self.configuration.concurrency(),
            self.configuration.speed(),
        )
    }
}
