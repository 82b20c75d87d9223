use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use log::{info, warn};

use super::request::GroupingRequest;
use super::{GraphDataService, ServiceError};
use crate::graph_utils::graph::{GraphPayload, KeySet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Databases,
    Keys,
    Graph,
}

/// Monotonic token stamped on every outbound request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

/// Remembers the latest generation issued per request kind; only replies carrying it count.
#[derive(Debug, Default)]
pub struct GenerationTracker {
    next: u64,
    latest: HashMap<RequestKind, Generation>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, kind: RequestKind) -> Generation {
        self.next += 1;
        let generation = Generation(self.next);
        self.latest.insert(kind, generation);
        // a graph drawn for the previous key set would not match the reset selection
        if kind == RequestKind::Keys {
            self.latest.insert(RequestKind::Graph, generation);
        }
        generation
    }

    pub fn is_current(&self, kind: RequestKind, generation: Generation) -> bool {
        self.latest.get(&kind) == Some(&generation)
    }

    pub fn latest(&self, kind: RequestKind) -> Option<Generation> {
        self.latest.get(&kind).copied()
    }
}

#[derive(Debug, Clone)]
pub enum ServiceJob {
    ListDatabases,
    LoadKeys { database: String },
    WholeGraph { database: String },
    Grouping(GroupingRequest),
}

impl ServiceJob {
    pub fn kind(&self) -> RequestKind {
        match self {
            ServiceJob::ListDatabases => RequestKind::Databases,
            ServiceJob::LoadKeys { .. } => RequestKind::Keys,
            ServiceJob::WholeGraph { .. } | ServiceJob::Grouping(_) => RequestKind::Graph,
        }
    }
}

#[derive(Debug)]
pub enum ReplyPayload {
    Databases(Vec<String>),
    Keys { database: String, keys: KeySet },
    WholeGraph(GraphPayload),
    Grouped(GraphPayload),
}

#[derive(Debug)]
pub struct ServiceReply {
    pub kind: RequestKind,
    pub generation: Generation,
    pub result: Result<ReplyPayload, ServiceError>,
}

fn run_job<S: GraphDataService + ?Sized>(service: &S, job: ServiceJob) -> Result<ReplyPayload, ServiceError> {
    match job {
        ServiceJob::ListDatabases => service.list_databases().map(ReplyPayload::Databases),
        ServiceJob::LoadKeys { database } => {
            let keys = service.get_keys(&database)?;
            Ok(ReplyPayload::Keys { database, keys })
        }
        ServiceJob::WholeGraph { database } => service.get_whole_graph(&database).map(ReplyPayload::WholeGraph),
        ServiceJob::Grouping(request) => service.run_grouping_query(&request).map(ReplyPayload::Grouped),
    }
}

type Notify = Box<dyn Fn() + Send>;

/// Runs data service calls on a worker thread so the GUI never blocks, and drops replies
/// that a newer request of the same kind has superseded.
pub struct ServiceBroker {
    jobs: Option<Sender<(Generation, ServiceJob)>>,
    replies: Receiver<ServiceReply>,
    tracker: GenerationTracker,
}

impl ServiceBroker {
    pub fn spawn<S: GraphDataService + 'static>(service: S) -> std::io::Result<Self> {
        Self::spawn_with_notify(service, Box::new(|| {}))
    }

    /// `notify` runs on the worker after each reply is queued (e.g. to wake the UI).
    pub fn spawn_with_notify<S: GraphDataService + 'static>(service: S, notify: Notify) -> std::io::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<(Generation, ServiceJob)>();
        let (reply_tx, reply_rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("data-service".into())
            .spawn(move || {
                for (generation, job) in job_rx {
                    let kind = job.kind();
                    let result = run_job(&service, job);
                    if let Err(e) = &result {
                        warn!("data service {:?} request failed: {}", kind, e);
                    }
                    if reply_tx.send(ServiceReply { kind, generation, result }).is_err() {
                        break;
                    }
                    notify();
                }
            })?;
        Ok(Self { jobs: Some(job_tx), replies: reply_rx, tracker: GenerationTracker::new() })
    }

    pub fn submit(&mut self, job: ServiceJob) -> Result<Generation, ServiceError> {
        let generation = self.tracker.issue(job.kind());
        let tx = self.jobs.as_ref().ok_or(ServiceError::Disconnected)?;
        tx.send((generation, job)).map_err(|_| ServiceError::Disconnected)?;
        Ok(generation)
    }

    /// Supersede whatever `kind` request is in flight without sending a new one.
    pub fn invalidate(&mut self, kind: RequestKind) -> Generation {
        let generation = self.tracker.issue(kind);
        info!("invalidated outstanding {:?} requests at {:?}", kind, generation);
        generation
    }

    pub fn tracker(&self) -> &GenerationTracker {
        &self.tracker
    }

    fn keep(&self, reply: &ServiceReply) -> bool {
        let current = self.tracker.is_current(reply.kind, reply.generation);
        if !current {
            info!("dropping stale {:?} reply {:?}", reply.kind, reply.generation);
        }
        current
    }

    /// Drain every finished reply without blocking; stale replies are discarded.
    pub fn poll(&mut self) -> Vec<ServiceReply> {
        let mut out = Vec::new();
        while let Ok(reply) = self.replies.try_recv() {
            if self.keep(&reply) {
                out.push(reply);
            }
        }
        out
    }

    /// Block until a current reply arrives or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<ServiceReply> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.replies.recv_timeout(left) {
                Ok(reply) if self.keep(&reply) => return Some(reply),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

impl Drop for ServiceBroker {
    fn drop(&mut self) {
        // The worker is detached; it exits after its current call once the job channel closes.
        self.jobs.take();
    }
}
