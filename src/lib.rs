pub mod configuration;
pub mod data;
pub mod error;
pub mod executor;
pub mod http_client;
pub mod log_blocks;
pub mod log_format;
pub mod log_parser;
pub mod parameters;
pub mod replayer;
pub mod report;
pub mod scheduler;

pub use configuration::ReplayConfiguration;
pub use data::{HttpMethod, Parameters, Request, RequestData, ResponseData, ResponseFormat};
pub use error::Error;
pub use executor::RequestExecutor;
pub use http_client::{HttpClient, HyperHttpClient};
pub use replayer::RequestLogReplayer;
pub use report::{
    write_report, ReplayOutcome, ReplayReport, ReportSink, StdoutReportSink, WriterReportSink,
};
pub use scheduler::{GroupState, ReplayGroup, ReplayRun, ReplayScheduler};
