//! In-memory hypermedia resource state.
//!
//! A [`Resource`] is the local image of one remote, URI-identified resource.
//! It carries three reserved pieces of state — the immutable `uri`, the typed
//! `links` relation map, and the `sync_time` bookkeeping field — plus an open
//! bag of application fields merged verbatim from JSON response bodies.
//!
//! # Invariants
//!
//! - `uri` never changes after construction
//! - `sync_time` is owned by the sync engine: set by GET/PUT, cleared by
//!   DELETE, never taken from a response body
//! - merges are shallow and validate before mutating, so a failed merge
//!   leaves the resource untouched

use crate::error::Result;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A link relation target: either a bare URI string or a structured
/// `{"href": ...}` object. Both shapes appear on the wire and both are
/// preserved as received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    /// Structured form, e.g. `{"href": "http://example.com/profile"}`.
    Href { href: String },
    /// Bare URI string form.
    Uri(String),
}

impl Link {
    /// The target URI regardless of wire shape.
    #[must_use]
    pub fn href(&self) -> &str {
        match self {
            Link::Href { href } => href,
            Link::Uri(uri) => uri,
        }
    }
}

/// The local image of one remote resource.
///
/// Obtained from a [`ResourceContext`](crate::ResourceContext) as a shared
/// handle; within a context there is exactly one `Resource` per URI and every
/// holder observes the same mutations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resource {
    uri: String,
    /// Relation name to link target.
    pub links: BTreeMap<String, Link>,
    /// Milliseconds since epoch of the last confirmed sync (GET or PUT).
    /// `None` means never synced, or deleted.
    pub sync_time: Option<u64>,
    /// Application fields merged from response bodies.
    pub fields: Map<String, Value>,
}

/// Body keys that map to reserved, engine-owned state rather than the open
/// field bag.
const RESERVED_KEYS: [&str; 3] = ["uri", "links", "syncTime"];

impl Resource {
    /// Create an empty, never-synced resource for a URI.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Resource {
        Resource {
            uri: uri.into(),
            links: BTreeMap::new(),
            sync_time: None,
            fields: Map::new(),
        }
    }

    /// The canonical identity key. Immutable after creation.
    #[inline]
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Look up an application field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Shallow-merge a JSON response body onto this resource.
    ///
    /// Application fields overwrite existing entries verbatim. A `"links"`
    /// object is deserialized rel-by-rel into the typed link map and
    /// overwrites existing relations. `"uri"` and `"syncTime"` are ignored:
    /// identity is immutable and sync state belongs to the engine.
    ///
    /// Validation happens before any mutation, so an error leaves the
    /// resource exactly as it was.
    pub fn merge_body(&mut self, body: &Map<String, Value>) -> Result<()> {
        let parsed_links = match body.get("links") {
            Some(value) => serde_json::from_value::<BTreeMap<String, Link>>(value.clone())?,
            None => BTreeMap::new(),
        };

        for (key, value) in body {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }
        for (rel, link) in parsed_links {
            self.links.insert(rel, link);
        }
        Ok(())
    }

    /// Structural merge from another resource image, overwriting fields,
    /// links, and sync time. Used by cross-context copy.
    pub fn absorb(&mut self, other: &Resource) {
        for (key, value) in &other.fields {
            self.fields.insert(key.clone(), value.clone());
        }
        for (rel, link) in &other.links {
            self.links.insert(rel.clone(), link.clone());
        }
        self.sync_time = other.sync_time;
    }

    /// The representation sent as a PUT body: the application fields only.
    ///
    /// Reserved metadata (`uri`, `links`, `syncTime`) is local bookkeeping
    /// and is not round-tripped to the server.
    #[must_use]
    pub fn state_body(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Wire shape exposed to consumers: `uri`, `links`, `syncTime`, then the
/// application fields flattened alongside.
impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("uri", &self.uri)?;
        map.serialize_entry("links", &self.links)?;
        map.serialize_entry("syncTime", &self.sync_time)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_new_resource_is_empty() {
        let resource = Resource::new("http://example.com");
        assert_eq!(resource.uri(), "http://example.com");
        assert!(resource.links.is_empty());
        assert!(resource.fields.is_empty());
        assert_eq!(resource.sync_time, None);
    }

    #[test]
    fn test_merge_plain_fields() {
        let mut resource = Resource::new("http://example.com");
        resource
            .merge_body(&body(json!({"name": "John", "age": 42})))
            .unwrap();
        assert_eq!(resource.field("name"), Some(&json!("John")));
        assert_eq!(resource.field("age"), Some(&json!(42)));
    }

    #[test]
    fn test_merge_overwrites_shallowly() {
        let mut resource = Resource::new("http://example.com");
        resource.merge_body(&body(json!({"name": "John"}))).unwrap();
        resource.merge_body(&body(json!({"name": "Jane"}))).unwrap();
        assert_eq!(resource.field("name"), Some(&json!("Jane")));
        assert_eq!(resource.fields.len(), 1);
    }

    #[test]
    fn test_merge_links_both_shapes() {
        let mut resource = Resource::new("http://example.com");
        resource
            .merge_body(&body(json!({
                "links": {
                    "self": "http://example.com",
                    "profile": {"href": "http://example.com/profile"}
                }
            })))
            .unwrap();
        assert_eq!(
            resource.links.get("self"),
            Some(&Link::Uri("http://example.com".into()))
        );
        assert_eq!(
            resource.links.get("profile"),
            Some(&Link::Href {
                href: "http://example.com/profile".into()
            })
        );
        // Links are reserved, not part of the open bag.
        assert!(resource.field("links").is_none());
    }

    #[test]
    fn test_merge_ignores_reserved_identity_keys() {
        let mut resource = Resource::new("http://example.com");
        resource
            .merge_body(&body(json!({"uri": "http://evil", "syncTime": 7, "name": "John"})))
            .unwrap();
        assert_eq!(resource.uri(), "http://example.com");
        assert_eq!(resource.sync_time, None);
        assert_eq!(resource.field("name"), Some(&json!("John")));
    }

    #[test]
    fn test_merge_bad_links_leaves_resource_untouched() {
        let mut resource = Resource::new("http://example.com");
        let result = resource.merge_body(&body(json!({"name": "John", "links": {"self": 42}})));
        assert!(result.is_err());
        assert!(resource.fields.is_empty());
        assert!(resource.links.is_empty());
    }

    #[test]
    fn test_absorb_copies_everything() {
        let mut source = Resource::new("http://example.com");
        source.merge_body(&body(json!({"name": "John"}))).unwrap();
        source
            .links
            .insert("profile".into(), Link::Uri("http://example.com/profile".into()));
        source.sync_time = Some(5);

        let mut target = Resource::new("http://example.com");
        target.absorb(&source);
        assert_eq!(target.field("name"), Some(&json!("John")));
        assert_eq!(target.links.get("profile").map(Link::href), Some("http://example.com/profile"));
        assert_eq!(target.sync_time, Some(5));
    }

    #[test]
    fn test_state_body_is_fields_only() {
        let mut resource = Resource::new("http://example.com");
        assert_eq!(resource.state_body(), json!({}));
        resource.merge_body(&body(json!({"name": "John"}))).unwrap();
        assert_eq!(resource.state_body(), json!({"name": "John"}));
    }

    #[test]
    fn test_wire_serialization() {
        let mut resource = Resource::new("http://example.com");
        resource.sync_time = Some(9);
        resource.merge_body(&body(json!({"name": "John"}))).unwrap();
        resource
            .links
            .insert("profile".into(), Link::Href { href: "http://p".into() });

        let wire = serde_json::to_value(&resource).unwrap();
        assert_eq!(
            wire,
            json!({
                "uri": "http://example.com",
                "links": {"profile": {"href": "http://p"}},
                "syncTime": 9,
                "name": "John"
            })
        );
    }

    #[test]
    fn test_link_round_trip() {
        let uri: Link = serde_json::from_value(json!("http://x")).unwrap();
        assert_eq!(uri, Link::Uri("http://x".into()));
        let href: Link = serde_json::from_value(json!({"href": "http://x"})).unwrap();
        assert_eq!(href, Link::Href { href: "http://x".into() });
        assert_eq!(serde_json::to_value(&href).unwrap(), json!({"href": "http://x"}));
    }
}
