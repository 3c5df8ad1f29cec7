use crate::{
    configuration::validate_replay_limits, data::Request, error::Error, executor::RequestExecutor,
};
use futures::future::join_all;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{runtime::Handle, task::JoinHandle, time};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    Pending,
    Fired,
    Done,
}

/// Requests that were captured the same number of seconds after the first request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayGroup {
    interval: u64,
    requests: Vec<Request>,
}

impl ReplayGroup {
    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }
}

/// Groups requests by interval. Groups come out in the order their first request appears,
/// and keep their requests in input order.
pub fn group_requests(requests: &[Request]) -> Vec<ReplayGroup> {
    let mut groups: Vec<ReplayGroup> = Vec::new();
    let mut positions: HashMap<u64, usize> = HashMap::new();

    for request in requests {
        match positions.get(&request.interval) {
            Some(&position) => groups[position].requests.push(request.clone()),
            None => {
                positions.insert(request.interval, groups.len());
                groups.push(ReplayGroup {
                    interval: request.interval,
                    requests: vec![request.clone()],
                });
            }
        }
    }

    groups
}

fn set_state(state: &Mutex<GroupState>, new_state: GroupState) {
    *state.lock().unwrap_or_else(|e| e.into_inner()) = new_state;
}

struct ReplayTask {
    group: ReplayGroup,
    delay: Duration,
    concurrency: usize,
    fired_requests: usize,
    state: Arc<Mutex<GroupState>>,
    executor: RequestExecutor,
}

impl ReplayTask {
    async fn run(self) {
        time::sleep(self.delay).await;
        set_state(&self.state, GroupState::Fired);
        debug!(
            "Firing {} requests captured at +{}s",
            self.fired_requests,
            self.group.interval
        );

        for _ in 0..self.concurrency {
            for request in &self.group.requests {
                self.executor.execute(request).await;
            }
        }

        set_state(&self.state, GroupState::Done);
    }
}

#[derive(Debug)]
struct ScheduledGroup {
    interval: u64,
    delay: Duration,
    state: Arc<Mutex<GroupState>>,
    handle: JoinHandle<()>,
}

/// A replay in progress. Dropping it leaves the remaining groups running.
#[derive(Debug)]
pub struct ReplayRun {
    groups: Vec<ScheduledGroup>,
    total_requests: usize,
}

impl ReplayRun {
    /// How many requests the run issues once every group is done.
    pub fn total_requests(&self) -> usize {
        self.total_requests
    }

    pub fn group_delays(&self) -> Vec<(u64, Duration)> {
        self.groups.iter().map(|g| (g.interval, g.delay)).collect()
    }

    pub fn group_states(&self) -> Vec<(u64, GroupState)> {
        self.groups
            .iter()
            .map(|g| (g.interval, *g.state.lock().unwrap_or_else(|e| e.into_inner())))
            .collect()
    }

    pub async fn wait(self) {
        let handles = self.groups.into_iter().map(|g| g.handle);

        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!("Replay group stopped early: {}", e);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplayScheduler {
    executor: RequestExecutor,
}

impl ReplayScheduler {
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    /// Starts one timer per group on the current tokio runtime and returns without waiting
    /// for any of them. A group fires `interval / speed` seconds from now and replays each of
    /// its requests `concurrency` times.
    pub fn schedule(
        &self,
        requests: &[Request],
        concurrency: usize,
        speed: f64,
    ) -> Result<ReplayRun, Error> {
        validate_replay_limits(concurrency, speed)?;
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let total_requests = requests
            .len()
            .checked_mul(concurrency)
            .ok_or(Error::InvalidConcurrency)?;

        let groups = group_requests(requests);
        let mut tasks = Vec::with_capacity(groups.len());
        for group in groups {
            let delay = Duration::try_from_secs_f64(group.interval as f64 / speed)
                .map_err(|_| Error::InvalidSpeed(speed))?;
            // bounded by total_requests
            let fired_requests = group.requests.len() * concurrency;
            tasks.push(ReplayTask {
                group,
                delay,
                concurrency,
                fired_requests,
                state: Arc::new(Mutex::new(GroupState::Pending)),
                executor: self.executor.clone(),
            });
        }

        info!("Started {} replays.", total_requests);

        let groups = tasks
            .into_iter()
            .map(|task| ScheduledGroup {
                interval: task.group.interval,
                delay: task.delay,
                state: task.state.clone(),
                handle: runtime.spawn(task.run()),
            })
            .collect();

        Ok(ReplayRun {
            groups,
            total_requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{HttpMethod, Parameters, RequestData, ResponseData, ResponseFormat},
        http_client::HttpClient,
        report::{ReplayReport, ReportSink},
    };
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, FixedOffset, TimeZone};
    use tokio::time::Instant;

    #[derive(Debug, Default)]
    struct RecordingHttpClient {
        calls: Mutex<Vec<(Instant, RequestData)>>,
    }

    #[async_trait]
    impl HttpClient for RecordingHttpClient {
        async fn make_request(&self, request_data: &RequestData) -> Result<ResponseData, Error> {
            self.calls
                .lock()
                .unwrap()
                .push((Instant::now(), request_data.clone()));
            Ok(ResponseData {
                status_code: 200,
                headers: HashMap::new(),
                body: String::new(),
            })
        }
    }

    #[derive(Debug)]
    struct SilentSink;

    impl ReportSink for SilentSink {
        fn report(&self, _: &ReplayReport) {}
    }

    fn request(uri: &str, interval: u64) -> Request {
        Request {
            method: HttpMethod::Get,
            uri: uri.into(),
            host: "localhost".into(),
            format: ResponseFormat::Json,
            timestamp: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2011, 3, 25, 14, 32, 0)
                .unwrap()
                + ChronoDuration::seconds(interval as i64),
            parameters: Parameters::new(),
            interval,
        }
    }

    fn scheduler() -> (ReplayScheduler, Arc<RecordingHttpClient>) {
        let http_client = Arc::new(RecordingHttpClient::default());
        let executor = RequestExecutor::new(http_client.clone(), Arc::new(SilentSink), "test");
        (ReplayScheduler::new(executor), http_client)
    }

    #[test]
    fn groups_by_interval_in_first_seen_order() {
        let requests = vec![
            request("/a", 5),
            request("/b", 0),
            request("/c", 5),
            request("/d", 2),
        ];
        let groups = group_requests(&requests);

        let summary: Vec<(u64, Vec<&str>)> = groups
            .iter()
            .map(|g| {
                (
                    g.interval(),
                    g.requests().iter().map(|r| r.uri.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![(5, vec!["/a", "/c"]), (0, vec!["/b"]), (2, vec!["/d"])]
        );
    }

    #[test]
    fn scheduling_needs_a_runtime() {
        let (scheduler, _) = scheduler();

        assert!(matches!(
            scheduler.schedule(&[request("/", 0)], 1, 1.0),
            Err(Error::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn rejects_invalid_limits() {
        let (scheduler, _) = scheduler();
        let requests = [request("/", 0)];

        assert!(matches!(
            scheduler.schedule(&requests, 0, 1.0),
            Err(Error::InvalidConcurrency)
        ));
        assert!(matches!(
            scheduler.schedule(&requests, 1, 0.0),
            Err(Error::InvalidSpeed(_))
        ));
    }

    #[tokio::test]
    async fn rejects_concurrency_that_overflows_the_total() {
        let (scheduler, http_client) = scheduler();
        let requests = [request("/1", 0), request("/2", 0)];

        assert!(matches!(
            scheduler.schedule(&requests, usize::MAX, 1.0),
            Err(Error::InvalidConcurrency)
        ));
        assert!(http_client.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fires_groups_after_their_interval() {
        let (scheduler, http_client) = scheduler();
        let requests = vec![request("/1", 0), request("/2", 5)];
        let start = Instant::now();

        let run = scheduler.schedule(&requests, 1, 1.0).unwrap();
        assert_eq!(run.total_requests(), 2);
        assert_eq!(
            run.group_states(),
            vec![(0, GroupState::Pending), (5, GroupState::Pending)]
        );
        run.wait().await;

        let calls = http_client.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1.url, "http://localhost/1");
        assert!(calls[0].0 - start < Duration::from_secs(1));
        assert_eq!(calls[1].1.url, "http://localhost/2");
        assert!(calls[1].0 - start >= Duration::from_secs(5));
        assert!(calls[1].0 - start < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn speed_scales_delays_and_concurrency_replicates() {
        let (scheduler, http_client) = scheduler();
        let requests = vec![request("/1", 0), request("/2", 5), request("/3", 5)];
        let start = Instant::now();

        let run = scheduler.schedule(&requests, 3, 0.5).unwrap();
        assert_eq!(run.total_requests(), 9);
        assert_eq!(
            run.group_delays(),
            vec![(0, Duration::from_secs(0)), (5, Duration::from_secs(10))]
        );
        run.wait().await;

        let calls = http_client.calls.lock().unwrap();
        let urls: Vec<&str> = calls.iter().map(|(_, data)| data.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://localhost/1",
                "http://localhost/1",
                "http://localhost/1",
                "http://localhost/2",
                "http://localhost/3",
                "http://localhost/2",
                "http://localhost/3",
                "http://localhost/2",
                "http://localhost/3",
            ]
        );
        assert!(calls[3].0 - start >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn groups_reach_done() {
        let (scheduler, _) = scheduler();
        let requests = vec![request("/1", 1), request("/2", 3)];

        let run = scheduler.schedule(&requests, 2, 2.0).unwrap();
        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(
            run.group_states(),
            vec![(1, GroupState::Done), (3, GroupState::Done)]
        );
        run.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_batch_schedules_nothing() {
        let (scheduler, http_client) = scheduler();

        let run = scheduler.schedule(&[], 4, 1.0).unwrap();
        assert_eq!(run.total_requests(), 0);
        assert!(run.group_states().is_empty());
        run.wait().await;

        assert!(http_client.calls.lock().unwrap().is_empty());
    }
}
