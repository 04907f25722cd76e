//! In-process queue store.
//!
//! Lays jobs out under the same key names Redis would hold, so discovery runs
//! unchanged against it. Supports injected failures and counts scans and
//! opened handles, which makes it the backend for tests and local demos.

use crate::error::{MonitorError, MonitorResult};
use crate::job::{JobState, JobStatus};
use crate::record::JobRecord;
use crate::redis::BullKeys;
use crate::store::{QueueHandle, QueueStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Key conventions a queue is stored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLayout {
    /// BullMQ: a `{prefix}:{queue}:meta` hash exists for every queue.
    BullMq,
    /// Legacy Bull: no metadata hash.
    Legacy,
}

#[derive(Debug)]
struct MemoryQueue {
    layout: KeyLayout,
    paused: bool,
    jobs: Vec<(JobState, JobRecord)>,
}

impl MemoryQueue {
    fn new(layout: KeyLayout) -> Self {
        Self {
            layout,
            paused: false,
            jobs: Vec::new(),
        }
    }

    fn keys(&self, keys: &BullKeys, name: &str) -> Vec<String> {
        let mut out = vec![format!("{}:{}:id", keys.prefix(), name)];

        match self.layout {
            KeyLayout::BullMq => {
                out.push(keys.meta(name));
                out.push(format!("{}:{}:events", keys.prefix(), name));
            }
            KeyLayout::Legacy if self.paused => out.push(keys.meta_paused(name)),
            KeyLayout::Legacy => {}
        }

        let mut containers: Vec<String> = Vec::new();
        for (state, record) in &self.jobs {
            let container = match state {
                JobState::Completed => keys.completed(name),
                JobState::Failed => keys.failed(name),
                JobState::Active => keys.active(name),
                JobState::Waiting if self.paused => keys.paused(name),
                JobState::Waiting => keys.wait(name),
                JobState::Delayed => keys.delayed(name),
                JobState::Prioritized => keys.prioritized(name),
                JobState::WaitingChildren => keys.waiting_children(name),
                JobState::Unknown => continue,
            };
            if !containers.contains(&container) {
                containers.push(container);
            }
            out.push(keys.job(name, &record.id));
        }
        out.extend(containers);
        out
    }
}

#[derive(Debug)]
struct MemoryState {
    keys: BullKeys,
    queues: RwLock<BTreeMap<String, MemoryQueue>>,
    failing_pairs: RwLock<HashSet<(String, JobStatus)>>,
    failing_queues: RwLock<HashSet<String>>,
    scan_failing: AtomicBool,
    quit: AtomicBool,
    scan_calls: AtomicUsize,
    handles_opened: AtomicUsize,
}

/// Process-local store with Bull semantics.
#[derive(Debug, Clone)]
pub struct InMemoryQueueStore {
    state: Arc<MemoryState>,
}

impl InMemoryQueueStore {
    /// Creates an empty store using the `bull` prefix.
    pub fn new() -> Self {
        Self::with_prefix("bull")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            state: Arc::new(MemoryState {
                keys: BullKeys::new(prefix),
                queues: RwLock::new(BTreeMap::new()),
                failing_pairs: RwLock::new(HashSet::new()),
                failing_queues: RwLock::new(HashSet::new()),
                scan_failing: AtomicBool::new(false),
                quit: AtomicBool::new(false),
                scan_calls: AtomicUsize::new(0),
                handles_opened: AtomicUsize::new(0),
            }),
        }
    }

    /// Registers an empty queue.
    pub fn add_queue(&self, queue: &str, layout: KeyLayout) {
        self.state
            .queues
            .write()
            .entry(queue.to_string())
            .or_insert_with(|| MemoryQueue::new(layout))
            .layout = layout;
    }

    /// Adds a job, creating a BullMQ-layout queue if needed.
    pub fn add_job(&self, queue: &str, state: JobState, record: JobRecord) {
        self.state
            .queues
            .write()
            .entry(queue.to_string())
            .or_insert_with(|| MemoryQueue::new(KeyLayout::BullMq))
            .jobs
            .push((state, record));
    }

    pub fn set_paused(&self, queue: &str, paused: bool) {
        if let Some(q) = self.state.queues.write().get_mut(queue) {
            q.paused = paused;
        }
    }

    /// Makes page reads for one (queue, status) pair fail.
    pub fn fail_fetch(&self, queue: &str, status: JobStatus) {
        self.state
            .failing_pairs
            .write()
            .insert((queue.to_string(), status));
    }

    /// Makes every read against a queue fail.
    pub fn fail_queue(&self, queue: &str) {
        self.state.failing_queues.write().insert(queue.to_string());
    }

    pub fn fail_scans(&self, failing: bool) {
        self.state.scan_failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `scan_keys` calls so far.
    pub fn scan_calls(&self) -> usize {
        self.state.scan_calls.load(Ordering::SeqCst)
    }

    /// Number of queue handles opened so far.
    pub fn handles_opened(&self) -> usize {
        self.state.handles_opened.load(Ordering::SeqCst)
    }

    pub fn is_quit(&self) -> bool {
        self.state.quit.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryQueueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    fn key_prefix(&self) -> &str {
        self.state.keys.prefix()
    }

    fn open_queue(&self, queue: &str) -> Arc<dyn QueueHandle> {
        self.state.handles_opened.fetch_add(1, Ordering::SeqCst);
        Arc::new(InMemoryQueueHandle {
            state: Arc::clone(&self.state),
            queue: queue.to_string(),
            closed: AtomicBool::new(false),
        })
    }

    async fn scan_keys(&self, pattern: &str) -> MonitorResult<Vec<String>> {
        self.state.scan_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.quit.load(Ordering::SeqCst) {
            return Err(MonitorError::Closed);
        }
        if self.state.scan_failing.load(Ordering::SeqCst) {
            return Err(MonitorError::Store("scan failed".to_string()));
        }

        let queues = self.state.queues.read();
        let keys = queues
            .iter()
            .flat_map(|(name, queue)| queue.keys(&self.state.keys, name))
            .filter(|key| glob_match(pattern, key))
            .collect();
        Ok(keys)
    }

    async fn ping(&self) -> MonitorResult<()> {
        if self.state.quit.load(Ordering::SeqCst) {
            return Err(MonitorError::Closed);
        }
        Ok(())
    }

    async fn quit(&self) -> MonitorResult<()> {
        self.state.quit.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct InMemoryQueueHandle {
    state: Arc<MemoryState>,
    queue: String,
    closed: AtomicBool,
}

impl InMemoryQueueHandle {
    fn check(&self) -> MonitorResult<()> {
        if self.closed.load(Ordering::SeqCst) || self.state.quit.load(Ordering::SeqCst) {
            return Err(MonitorError::Closed);
        }
        if self.state.failing_queues.read().contains(&self.queue) {
            return Err(MonitorError::Store(format!("queue {} unavailable", self.queue)));
        }
        Ok(())
    }

    fn records(&self, status: JobStatus) -> Vec<JobRecord> {
        let queues = self.state.queues.read();
        queues
            .get(&self.queue)
            .map(|q| {
                q.jobs
                    .iter()
                    .filter(|(state, _)| *state == JobState::from(status))
                    .map(|(_, record)| record.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueueHandle for InMemoryQueueHandle {
    fn queue_name(&self) -> &str {
        &self.queue
    }

    async fn count(&self, status: JobStatus) -> MonitorResult<u64> {
        self.check()?;
        Ok(self.records(status).len() as u64)
    }

    async fn is_paused(&self) -> MonitorResult<bool> {
        self.check()?;
        Ok(self
            .state
            .queues
            .read()
            .get(&self.queue)
            .is_some_and(|q| q.paused))
    }

    async fn page(&self, status: JobStatus, start: usize, end: usize) -> MonitorResult<Vec<JobRecord>> {
        self.check()?;
        if self
            .state
            .failing_pairs
            .read()
            .contains(&(self.queue.clone(), status))
        {
            return Err(MonitorError::Store(format!(
                "fetching {} jobs from {} failed",
                status, self.queue
            )));
        }

        Ok(self
            .records(status)
            .into_iter()
            .skip(start)
            .take((end + 1).saturating_sub(start))
            .collect())
    }

    async fn get_job(&self, id: &str) -> MonitorResult<Option<JobRecord>> {
        self.check()?;
        let queues = self.state.queues.read();
        Ok(queues.get(&self.queue).and_then(|q| {
            q.jobs
                .iter()
                .find(|(_, record)| record.id == id)
                .map(|(_, record)| record.clone())
        }))
    }

    async fn get_state(&self, id: &str) -> MonitorResult<JobState> {
        self.check()?;
        let queues = self.state.queues.read();
        Ok(queues
            .get(&self.queue)
            .and_then(|q| q.jobs.iter().find(|(_, record)| record.id == id))
            .map_or(JobState::Unknown, |(state, _)| *state))
    }

    async fn close(&self) -> MonitorResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Redis-style glob match supporting `*` and `?`.
fn glob_match(pattern: &str, text: &str) -> bool {
    let (p, t) = (pattern.as_bytes(), text.as_bytes());
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == b'?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == b'*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((star_pi, star_ti)) = star {
            pi = star_pi + 1;
            ti = star_ti + 1;
            star = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == b'*')
}
