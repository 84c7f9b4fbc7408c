//! Shared "request in flight" signal

use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::watch;

/// One boolean loading indicator shared by overlapping operations.
///
/// Each operation holds a [`LoadingGuard`] for its lifetime. The flag reads
/// `true` while at least one guard is alive and flips back to `false` when
/// the last one drops, on success, error and early return alike.
///
/// # Example
///
/// ```
/// use registrar_lib::table::LoadingFlag;
///
/// let flag = LoadingFlag::new();
/// {
///     let _guard = flag.begin();
///     assert!(flag.is_loading());
/// }
/// assert!(!flag.is_loading());
/// ```
#[derive(Debug, Clone)]
pub struct LoadingFlag {
    inner: Arc<LoadingInner>,
}

#[derive(Debug)]
struct LoadingInner {
    in_flight: Mutex<usize>,
    tx: watch::Sender<bool>,
}

impl Default for LoadingFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingFlag {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(LoadingInner {
                in_flight: Mutex::new(0),
                tx,
            }),
        }
    }

    /// Marks one operation as started.
    pub fn begin(&self) -> LoadingGuard {
        let mut count = self.lock();
        *count += 1;
        if *count == 1 {
            self.inner.tx.send_replace(true);
        }
        LoadingGuard { flag: self.clone() }
    }

    pub fn is_loading(&self) -> bool {
        *self.inner.tx.borrow()
    }

    /// Number of operations currently running.
    pub fn in_flight(&self) -> usize {
        *self.lock()
    }

    /// Watches the flag for changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.tx.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, usize> {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn end(&self) {
        let mut count = self.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.inner.tx.send_replace(false);
        }
    }
}

/// Keeps a [`LoadingFlag`] raised until dropped.
#[derive(Debug)]
#[must_use = "the flag drops back as soon as the guard is dropped"]
pub struct LoadingGuard {
    flag: LoadingFlag,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.flag.end();
    }
}
