//! The resource context: an identity-mapped registry of resources.
//!
//! A [`ResourceContext`] guarantees that within its own namespace every
//! distinct URI resolves to exactly one shared [`Resource`] handle. Two
//! contexts never share handles, even for the same URI; state crosses
//! context boundaries only through [`ResourceContext::copy`], which is a
//! structural clone-merge.
//!
//! # Invariants
//!
//! - `get(u)` twice returns the identical handle (`Arc::ptr_eq`)
//! - distinct URIs resolve to distinct handles
//! - registry locks are held only across synchronous sections

use crate::resource::Resource;
use crate::sync::BusyCounter;
use crate::transport::Transport;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A shared, mutably-owned handle to a resource. All holders within a
/// context observe the same mutations.
pub type ResourceHandle = Arc<Mutex<Resource>>;

/// An isolated namespace owning one identity map of resources and the
/// transport used to synchronize them.
pub struct ResourceContext {
    resources: Mutex<HashMap<String, ResourceHandle>>,
    transport: Arc<dyn Transport>,
    busy: BusyCounter,
}

impl ResourceContext {
    /// Create a context using the process-wide busy counter.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> ResourceContext {
        Self::with_busy_counter(transport, BusyCounter::global().clone())
    }

    /// Create a context with an explicit busy counter. Used by tests and by
    /// hosts that want per-subsystem in-flight accounting.
    #[must_use]
    pub fn with_busy_counter(transport: Arc<dyn Transport>, busy: BusyCounter) -> ResourceContext {
        ResourceContext {
            resources: Mutex::new(HashMap::new()),
            transport,
            busy,
        }
    }

    /// Get or create the resource for a URI.
    ///
    /// Repeated calls with the same URI return the identical handle. Never
    /// fails: an unknown URI yields a fresh, empty, never-synced resource.
    #[must_use]
    pub fn get(&self, uri: &str) -> ResourceHandle {
        let mut resources = self.resources.lock();
        resources
            .entry(uri.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Resource::new(uri))))
            .clone()
    }

    /// Copy a resource from another context into this one.
    ///
    /// Resolves (or creates) the local resource for the source's URI and
    /// performs a structural merge of its fields, links, and sync time onto
    /// it. The source is never mutated and never aliased: the returned
    /// handle is owned by this context.
    #[must_use]
    pub fn copy(&self, source: &ResourceHandle) -> ResourceHandle {
        let local = {
            let source = source.lock();
            self.get(source.uri())
        };
        // Copying a context's own resource onto itself is a no-op; locking
        // both sides would deadlock.
        if !Arc::ptr_eq(&local, source) {
            let source = source.lock();
            local.lock().absorb(&source);
        }
        local
    }

    /// Number of resources currently registered in this context.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.lock().is_empty()
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The busy counter observed by this context's verb calls.
    #[must_use]
    pub fn busy_counter(&self) -> &BusyCounter {
        &self.busy
    }
}
