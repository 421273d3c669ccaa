//! HTTP verb protocol and in-flight request accounting.
//!
//! Verb-to-resource-state mapping:
//!
//! | Verb | Resource content | `sync_time` | Resolves with |
//! |--------|---------------------------|-------------|-------------------|
//! | GET | body merged, profile link | now | the handle |
//! | PUT | untouched | now | the handle |
//! | DELETE | untouched (kept stale) | `None` | the handle |
//! | POST | untouched | untouched | the raw response |
//!
//! Any failure propagates to the caller with the resource exactly as it was
//! before the call. The busy counter is incremented when a verb future first
//! runs and decremented when it settles, success or failure, so it always
//! returns to its pre-call value.
//!
//! Overlapping verbs on the same resource are not serialized here: if two
//! writes race, the resource reflects whichever settled last. Callers that
//! care must not issue overlapping writes to one resource.

use crate::context::{ResourceContext, ResourceHandle};
use crate::error::{ContextError, Result};
use crate::media_type::MediaType;
use crate::resource::Link;
use crate::transport::{Headers, TransportResponse};
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// Shared count of outstanding HTTP operations.
///
/// Cloning yields another observer of the same count. UI layers poll
/// [`count`](BusyCounter::count) for loading indicators; it is an observable
/// side effect, not a lock.
#[derive(Clone, Debug, Default)]
pub struct BusyCounter(Arc<AtomicUsize>);

impl BusyCounter {
    /// A fresh counter starting at zero.
    #[must_use]
    pub fn new() -> BusyCounter {
        BusyCounter(Arc::new(AtomicUsize::new(0)))
    }

    /// The process-wide counter shared by contexts built with
    /// [`ResourceContext::new`].
    pub fn global() -> &'static BusyCounter {
        static GLOBAL: OnceLock<BusyCounter> = OnceLock::new();
        GLOBAL.get_or_init(BusyCounter::new)
    }

    /// Current number of in-flight operations.
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// Increment the counter and return a guard that decrements it on drop.
    /// The pairing guarantees the counter never goes negative and never
    /// leaks on error or panic paths.
    fn begin(&self) -> BusyGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        BusyGuard {
            counter: Arc::clone(&self.0),
        }
    }
}

struct BusyGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

impl ResourceContext {
    /// GET the resource's representation and merge it in.
    ///
    /// Requests `Accept: application/json`. On success the parsed body is
    /// shallow-merged onto the resource; if the response `Content-Type`
    /// carries a `profile` parameter and the merge left no `profile` link,
    /// a structured `{href}` link is injected (a body-declared link wins
    /// over the header-derived one). `sync_time` is set to now. Resolves
    /// with the same handle.
    pub async fn http_get(&self, resource: &ResourceHandle) -> Result<ResourceHandle> {
        let uri = resource.lock().uri().to_string();
        let _busy = self.busy_counter().begin();
        tracing::debug!(uri = %uri, "GET");

        let mut headers = Headers::new();
        headers.insert("Accept".into(), "application/json".into());
        let response = self.transport().get(&uri, &headers).await?;
        ensure_success(&response)?;

        let body: serde_json::Value = serde_json::from_slice(&response.body)?;
        let body = body
            .as_object()
            .ok_or_else(|| ContextError::Body("expected a JSON object".into()))?;
        let profile = response
            .header("content-type")
            .and_then(|ct| MediaType::parse(ct).profile().map(str::to_string));

        {
            let mut resource = resource.lock();
            resource.merge_body(body)?;
            if let Some(profile) = profile {
                if !resource.links.contains_key("profile") {
                    resource.links.insert("profile".into(), Link::Href { href: profile });
                }
            }
            resource.sync_time = Some(now_ms());
        }
        Ok(resource.clone())
    }

    /// PUT the resource's current state to its URI.
    ///
    /// Sends the application fields as a JSON body. On success (any 2xx,
    /// including 204 No Content) `sync_time` is set to now; the content is
    /// not touched. Resolves with the same handle.
    pub async fn http_put(&self, resource: &ResourceHandle) -> Result<ResourceHandle> {
        let (uri, body) = {
            let resource = resource.lock();
            (resource.uri().to_string(), resource.state_body())
        };
        let _busy = self.busy_counter().begin();
        tracing::debug!(uri = %uri, "PUT");

        let mut headers = Headers::new();
        headers.insert("Content-Type".into(), "application/json".into());
        headers.insert("Accept".into(), "application/json, text/plain, */*".into());
        let body = Bytes::from(serde_json::to_vec(&body)?);
        let response = self.transport().put(&uri, body, &headers).await?;
        ensure_success(&response)?;

        resource.lock().sync_time = Some(now_ms());
        Ok(resource.clone())
    }

    /// DELETE the resource on the server.
    ///
    /// On success `sync_time` is cleared to mark the local image as no
    /// longer authoritative; fields and links are kept so UI transitions
    /// can still read the stale data. Resolves with the same handle.
    pub async fn http_delete(&self, resource: &ResourceHandle) -> Result<ResourceHandle> {
        let uri = resource.lock().uri().to_string();
        let _busy = self.busy_counter().begin();
        tracing::debug!(uri = %uri, "DELETE");

        let response = self.transport().delete(&uri, &Headers::new()).await?;
        ensure_success(&response)?;

        resource.lock().sync_time = None;
        Ok(resource.clone())
    }

    /// POST a body to the resource's URI.
    ///
    /// The resource is treated purely as a target: POST semantics are
    /// endpoint-defined, so neither content nor `sync_time` is touched.
    /// With `headers` omitted the transport's defaults apply. Resolves with
    /// the raw response.
    pub async fn http_post(
        &self,
        resource: &ResourceHandle,
        body: impl Into<Bytes>,
        headers: Option<Headers>,
    ) -> Result<TransportResponse> {
        let uri = resource.lock().uri().to_string();
        let _busy = self.busy_counter().begin();
        tracing::debug!(uri = %uri, "POST");

        let headers = headers.unwrap_or_default();
        self.transport().post(&uri, body.into(), &headers).await
    }
}

/// Defense against transports that resolve non-2xx responses.
fn ensure_success(response: &TransportResponse) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ContextError::Http {
            status: response.status,
            body: response.body_str().unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_zero() {
        assert_eq!(BusyCounter::new().count(), 0);
    }

    #[test]
    fn test_guard_pairs_increment_and_decrement() {
        let counter = BusyCounter::new();
        {
            let _a = counter.begin();
            let _b = counter.begin();
            assert_eq!(counter.count(), 2);
        }
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_clones_observe_the_same_count() {
        let counter = BusyCounter::new();
        let observer = counter.clone();
        let _guard = counter.begin();
        assert_eq!(observer.count(), 1);
    }

    #[test]
    fn test_guard_decrements_on_panic() {
        let counter = BusyCounter::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = counter.begin();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_now_ms_is_recent() {
        // Sanity bound: after 2020, before 2100.
        let now = now_ms();
        assert!(now > 1_577_836_800_000);
        assert!(now < 4_102_444_800_000);
    }
}
