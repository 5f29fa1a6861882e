use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
struct ScopeInner {
    unmounted: AtomicBool,
    generation: AtomicU64,
}

/// Lifetime of a mounted checkout.
///
/// Async work captures a [`Liveness`] when it starts and checks it before
/// applying its result. The token goes stale when the checkout unmounts or
/// when its request is replaced.
#[derive(Debug, Default)]
pub struct MountScope {
    inner: Arc<ScopeInner>,
}

/// A handle captured at the start of a request.
#[derive(Debug, Clone)]
pub struct Liveness {
    inner: Arc<ScopeInner>,
    generation: u64,
}

impl MountScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&self) -> Liveness {
        Liveness {
            inner: Arc::clone(&self.inner),
            generation: self.inner.generation.load(Ordering::SeqCst),
        }
    }

    /// Makes every previously captured token stale.
    pub fn invalidate(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn unmount(&self) {
        self.inner.unmounted.store(true, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        !self.inner.unmounted.load(Ordering::SeqCst)
    }
}

impl Liveness {
    pub fn is_live(&self) -> bool {
        !self.inner.unmounted.load(Ordering::SeqCst)
            && self.inner.generation.load(Ordering::SeqCst) == self.generation
    }
}
