//! In-memory sources for unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use jitfleet_core::{NodeId, Timestamp};

use crate::error::SourceError;
use crate::source::{NodeManagerSource, SourceFuture, WorkQueueSource};

fn ready<'a, T: Send + 'a>(result: Result<T, SourceError>) -> SourceFuture<'a, T> {
    Box::pin(async move { result })
}

fn transient(op: &str) -> SourceError {
    SourceError::Transient(format!("{op} unavailable"))
}

#[derive(Default)]
pub(crate) struct MockQueue {
    pub backlog: AtomicU64,
    pub agents: AtomicU64,
    pub fail: Mutex<HashSet<&'static str>>,
}

impl MockQueue {
    pub fn new(backlog: u64, agents: u64) -> Self {
        Self {
            backlog: AtomicU64::new(backlog),
            agents: AtomicU64::new(agents),
            fail: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_on(&self, op: &'static str) {
        self.fail.lock().unwrap().insert(op);
    }

    fn read(&self, op: &'static str, value: &AtomicU64) -> Result<u64, SourceError> {
        if self.fail.lock().unwrap().contains(op) {
            return Err(transient(op));
        }
        Ok(value.load(Ordering::SeqCst))
    }
}

impl WorkQueueSource for MockQueue {
    fn backlog(&self) -> SourceFuture<'_, u64> {
        ready(self.read("backlog", &self.backlog))
    }

    fn agent_count(&self) -> SourceFuture<'_, u64> {
        ready(self.read("agent_count", &self.agents))
    }
}

/// Node manager double that records every start/stop it accepts.
pub(crate) struct MockNodes {
    pub time: AtomicU64,
    pub managed: Mutex<Vec<NodeId>>,
    pub alive: Mutex<BTreeMap<NodeId, Timestamp>>,
    pub started: Mutex<Vec<NodeId>>,
    pub stopped: Mutex<Vec<NodeId>>,
    pub fail: Mutex<HashSet<&'static str>>,
    pub fail_stop_for: Mutex<HashSet<NodeId>>,
    pub time_reads: AtomicUsize,
}

impl MockNodes {
    pub fn new(managed: &[&str], time: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(time),
            managed: Mutex::new(managed.iter().map(|n| n.to_string()).collect()),
            alive: Mutex::new(BTreeMap::new()),
            started: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
            fail: Mutex::new(HashSet::new()),
            fail_stop_for: Mutex::new(HashSet::new()),
            time_reads: AtomicUsize::new(0),
        }
    }

    pub fn set_alive(&self, node: &str, since: Timestamp) {
        self.alive.lock().unwrap().insert(node.to_string(), since);
    }

    pub fn fail_on(&self, op: &'static str) {
        self.fail.lock().unwrap().insert(op);
    }

    pub fn fail_stop(&self, node: &str) {
        self.fail_stop_for.lock().unwrap().insert(node.to_string());
    }

    pub fn started(&self) -> Vec<NodeId> {
        self.started.lock().unwrap().clone()
    }

    pub fn stopped(&self) -> Vec<NodeId> {
        self.stopped.lock().unwrap().clone()
    }

    fn failing(&self, op: &'static str) -> bool {
        self.fail.lock().unwrap().contains(op)
    }
}

impl NodeManagerSource for MockNodes {
    fn time(&self) -> SourceFuture<'_, Timestamp> {
        self.time_reads.fetch_add(1, Ordering::SeqCst);
        if self.failing("time") {
            return ready(Err(transient("time")));
        }
        ready(Ok(self.time.load(Ordering::SeqCst)))
    }

    fn managed_nodes(&self) -> SourceFuture<'_, Vec<NodeId>> {
        if self.failing("managed_nodes") {
            return ready(Err(transient("managed_nodes")));
        }
        ready(Ok(self.managed.lock().unwrap().clone()))
    }

    fn alive_nodes(&self) -> SourceFuture<'_, BTreeMap<NodeId, Timestamp>> {
        if self.failing("alive_nodes") {
            return ready(Err(transient("alive_nodes")));
        }
        ready(Ok(self.alive.lock().unwrap().clone()))
    }

    fn start_node<'a>(&'a self, node: &'a str) -> SourceFuture<'a, ()> {
        if self.failing("start_node") {
            return ready(Err(transient("start_node")));
        }
        self.started.lock().unwrap().push(node.to_string());
        ready(Ok(()))
    }

    fn stop_node<'a>(&'a self, node: &'a str) -> SourceFuture<'a, ()> {
        if self.fail_stop_for.lock().unwrap().contains(node) {
            return ready(Err(transient("stop_node")));
        }
        self.stopped.lock().unwrap().push(node.to_string());
        ready(Ok(()))
    }
}
