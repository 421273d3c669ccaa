//! hypermedia_rs: client-side cache and synchronization for hypermedia
//! (HATEOAS-style) resources over HTTP.
//!
//! Within one [`ResourceContext`], every distinct URI maps to exactly one
//! in-memory [`Resource`] handle. HTTP verbs mutate that shared object
//! consistently, track remote-sync state, and surface link relations —
//! including links implied by the `Content-Type` `profile` parameter — as
//! first-class data.
//!
//! # Components
//!
//! - [`ResourceContext`]: the identity-mapped registry plus the verb methods
//!   (`http_get`, `http_put`, `http_post`, `http_delete`).
//! - [`Resource`] / [`Link`]: the local resource image with typed links, a
//!   sync timestamp, and an open JSON field bag.
//! - [`Transport`]: the HTTP seam; [`ReqwestTransport`] is the production
//!   implementation.
//! - [`BusyCounter`]: observable count of in-flight operations, shared
//!   process-wide by default.
//!
//! # Example
//!
//! ```no_run
//! use hypermedia_rs::{ResourceContext, ReqwestTransport};
//! use std::sync::Arc;
//!
//! # async fn run() -> hypermedia_rs::Result<()> {
//! let context = ResourceContext::new(Arc::new(ReqwestTransport::new()));
//! let user = context.get("http://example.com/users/1");
//! context.http_get(&user).await?;
//! println!("name: {:?}", user.lock().field("name"));
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod media_type;
pub mod resource;
pub mod sync;
pub mod transport;

pub use context::{ResourceContext, ResourceHandle};
pub use error::{ContextError, Result};
pub use media_type::MediaType;
pub use resource::{Link, Resource};
pub use sync::BusyCounter;
pub use transport::{Headers, ReqwestTransport, Transport, TransportConfig, TransportResponse};
