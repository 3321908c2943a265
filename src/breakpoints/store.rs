//! Breakpoint store
//!
//! In-memory registry of pending breakpoints. Each entry owns a one-shot
//! resume signal; removing the entry and firing the signal happen together,
//! so a breakpoint is resumed at most once.
//!
//! Entries never expire. A breakpoint whose HTTP caller went away stays
//! registered until someone resumes it. A caller whose entry is replaced by a
//! newer hit with the same id stays paused and unlisted; only
//! [`PauseRegistry::release_all`] lets it go.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::oneshot;

use super::types::BreakpointContext;

/// Registry of pending breakpoints
///
/// `BreakpointStore` is the unbounded implementation. Anything holding an
/// `Arc<dyn PauseRegistry>` can be handed a bounded or expiring variant
/// instead.
pub trait PauseRegistry: Send + Sync {
    /// Register a breakpoint and return a handle that resolves on resume.
    ///
    /// An existing entry with the same id is replaced (last write wins).
    fn add(&self, context: BreakpointContext) -> WaitHandle;

    /// Resume a single breakpoint. Returns false if it is not pending.
    fn try_resume(&self, id: &str) -> bool;

    /// Resume every breakpoint pending at call time. Returns the count.
    fn resume_all(&self) -> usize;

    /// Release every waiter, including callers whose entry was replaced.
    /// Used when the server shuts down.
    fn release_all(&self) -> usize {
        self.resume_all()
    }

    /// Snapshot of all pending breakpoints, in registration order
    fn get_all(&self) -> Vec<BreakpointContext>;

    /// Look up a pending breakpoint
    fn get(&self, id: &str) -> Option<BreakpointContext>;

    /// Number of pending breakpoints
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How a wait on a breakpoint ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Resumed by `try_resume` or `resume_all`
    Resumed,
    /// The store was dropped. The signal can no longer fire.
    Abandoned,
}

/// Handle returned by [`PauseRegistry::add`]
///
/// Waiting is where the pause actually happens; the registry itself never
/// blocks.
#[derive(Debug)]
pub struct WaitHandle {
    id: String,
    receiver: oneshot::Receiver<()>,
}

impl WaitHandle {
    /// Id of the breakpoint this handle waits on
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait until the breakpoint is resumed
    pub async fn wait(self) -> WaitOutcome {
        match self.receiver.await {
            Ok(()) => WaitOutcome::Resumed,
            Err(_) => WaitOutcome::Abandoned,
        }
    }
}

struct PendingBreakpoint {
    seq: u64,
    context: Arc<BreakpointContext>,
    signal: oneshot::Sender<()>,
}

/// Sharded in-memory breakpoint store
#[derive(Default)]
pub struct BreakpointStore {
    entries: DashMap<String, PendingBreakpoint>,
    /// Signals of entries replaced by a newer hit, keyed by their seq
    replaced: DashMap<u64, oneshot::Sender<()>>,
    next_seq: AtomicU64,
}

impl BreakpointStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl PauseRegistry for BreakpointStore {
    fn add(&self, context: BreakpointContext) -> WaitHandle {
        let (signal, receiver) = oneshot::channel();
        let id = context.id.clone();
        let entry = PendingBreakpoint {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            context: Arc::new(context),
            signal,
        };

        if let Some(previous) = self.entries.insert(id.clone(), entry) {
            tracing::warn!(id = %id, "Breakpoint id reused, previous caller stays paused");
            self.replaced.insert(previous.seq, previous.signal);
        }

        WaitHandle { id, receiver }
    }

    fn try_resume(&self, id: &str) -> bool {
        match self.entries.remove(id) {
            Some((_, entry)) => {
                // The waiter may already be gone (dropped connection); the
                // breakpoint still counts as resumed.
                let _ = entry.signal.send(());
                true
            }
            None => false,
        }
    }

    fn resume_all(&self) -> usize {
        let ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.iter().filter(|id| self.try_resume(id)).count()
    }

    fn release_all(&self) -> usize {
        let seqs: Vec<u64> = self.replaced.iter().map(|e| *e.key()).collect();
        let orphans = seqs
            .iter()
            .filter_map(|seq| self.replaced.remove(seq))
            .map(|(_, signal)| {
                let _ = signal.send(());
            })
            .count();

        self.resume_all() + orphans
    }

    fn get_all(&self) -> Vec<BreakpointContext> {
        let mut snapshot: Vec<(u64, Arc<BreakpointContext>)> = self
            .entries
            .iter()
            .map(|e| (e.seq, Arc::clone(&e.context)))
            .collect();
        snapshot.sort_by_key(|(seq, _)| *seq);

        snapshot
            .into_iter()
            .map(|(_, context)| (*context).clone())
            .collect()
    }

    fn get(&self, id: &str) -> Option<BreakpointContext> {
        self.entries.get(id).map(|e| (*e.context).clone())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn context(id: &str) -> BreakpointContext {
        BreakpointContext::new(id, "tests::Worker", "run")
    }

    #[tokio::test]
    async fn test_resume_is_exactly_once() {
        let store = BreakpointStore::new();
        let handle = store.add(context("bp-1"));

        assert!(store.try_resume("bp-1"));
        assert!(!store.try_resume("bp-1"));
        assert_eq!(handle.wait().await, WaitOutcome::Resumed);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_wait_blocks_until_resumed() {
        let store = BreakpointStore::new();
        let handle = store.add(context("bp-1"));

        let waiter = tokio::spawn(handle.wait());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        assert!(store.try_resume("bp-1"));
        assert_eq!(waiter.await.unwrap(), WaitOutcome::Resumed);
    }

    #[tokio::test]
    async fn test_resume_unknown_id() {
        let store = BreakpointStore::new();
        assert!(!store.try_resume("missing"));
        assert_eq!(store.resume_all(), 0);
    }

    #[tokio::test]
    async fn test_resume_all() {
        let store = BreakpointStore::new();
        let handles: Vec<_> = (0..3).map(|i| store.add(context(&format!("bp-{}", i)))).collect();

        assert_eq!(store.resume_all(), 3);
        assert!(store.is_empty());
        for handle in handles {
            assert_eq!(handle.wait().await, WaitOutcome::Resumed);
        }
        assert_eq!(store.resume_all(), 0);
    }

    #[tokio::test]
    async fn test_get_and_get_all() {
        let store = BreakpointStore::new();
        let _a = store.add(context("first"));
        let _b = store.add(context("second"));
        let _c = store.add(context("third"));

        let ids: Vec<String> = store.get_all().into_iter().map(|bp| bp.id).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);

        assert_eq!(store.get("second").map(|bp| bp.id), Some("second".to_string()));
        assert!(store.get("fourth").is_none());
        // Lookups have no side effect
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_same_id_last_write_wins() {
        let store = BreakpointStore::new();
        let old = store.add(BreakpointContext::new("dup", "T", "old"));
        let new = store.add(BreakpointContext::new("dup", "T", "new"));
        assert_eq!(old.id(), new.id());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("dup").map(|bp| bp.method), Some("new".to_string()));

        let old = tokio::spawn(old.wait());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!old.is_finished());

        assert!(store.try_resume("dup"));
        assert!(!store.try_resume("dup"));
        assert_eq!(new.wait().await, WaitOutcome::Resumed);

        // Neither resume_all nor a later hit releases the replaced caller
        assert_eq!(store.resume_all(), 0);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!old.is_finished());

        assert_eq!(store.release_all(), 1);
        assert_eq!(old.await.unwrap(), WaitOutcome::Resumed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_id_adds_leave_one_resumable() {
        let store = Arc::new(BreakpointStore::new());

        let adders: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.add(BreakpointContext::new("dup", "T", format!("hit-{}", i)))
                })
            })
            .collect();

        let mut handles = Vec::new();
        for adder in adders {
            handles.push(adder.await.unwrap());
        }

        assert_eq!(store.len(), 1);
        let resumed = (0..4).filter(|_| store.try_resume("dup")).count();
        assert_eq!(resumed, 1);

        let mut released = 0;
        for handle in handles {
            if let Ok(outcome) = tokio::time::timeout(Duration::from_millis(50), handle.wait()).await {
                assert_eq!(outcome, WaitOutcome::Resumed);
                released += 1;
            }
        }
        assert_eq!(released, 1);
        assert_eq!(store.release_all(), 15);
    }

    #[tokio::test]
    async fn test_dropped_store_abandons_waiters() {
        let store = BreakpointStore::new();
        let handle = store.add(context("bp-1"));
        drop(store);
        assert_eq!(handle.wait().await, WaitOutcome::Abandoned);
    }

    #[tokio::test]
    async fn test_resume_after_waiter_dropped() {
        let store = BreakpointStore::new();
        drop(store.add(context("gone")));

        // Entry stays until explicitly resumed
        assert_eq!(store.len(), 1);
        assert!(store.try_resume("gone"));
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resume_all_never_double_counts() {
        let store = Arc::new(BreakpointStore::new());
        let handles: Vec<_> = (0..200).map(|i| store.add(context(&format!("bp-{}", i)))).collect();

        let resumers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        store.resume_all()
                    } else {
                        (0..200).filter(|n| store.try_resume(&format!("bp-{}", n))).count()
                    }
                })
            })
            .collect();

        let mut total = 0;
        for resumer in resumers {
            total += resumer.await.unwrap();
        }

        assert_eq!(total, 200);
        assert!(store.is_empty());
        for handle in handles {
            assert_eq!(handle.wait().await, WaitOutcome::Resumed);
        }
    }
}
