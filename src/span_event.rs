//! Span events and their category-specific attributes
//!
//! Span events are the flat companion to the nested trace JSON: one record
//! per emitted segment, linked to its parent by position in the list.
//! Parents are always created before their children, so a plain index is a
//! safe back-reference for as long as the list lives.

use serde::Serialize;

use crate::segment::DataHash;

/// Span classification reported to the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanCategory {
    #[default]
    Generic,
    Http,
    Datastore,
}

/// Fields populated on datastore spans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatastoreSpanFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_statement: Option<String>,
}

/// Fields populated on external (outgoing HTTP) spans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalSpanFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

/// A flat record summarising one emitted segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanEvent {
    /// Opaque hex identifier. External segments that already carried a
    /// span id in an outgoing payload reuse it here.
    pub guid: String,
    pub name: String,
    /// Index of the parent span in the list this event belongs to.
    /// The root span has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    /// Segment start in ticks.
    pub timestamp: u64,
    /// Segment wall-clock duration in ticks.
    pub duration: u64,
    pub category: SpanCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datastore: Option<DatastoreSpanFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalSpanFields>,
}

impl SpanEvent {
    pub fn new(
        guid: String,
        name: String,
        parent: Option<usize>,
        timestamp: u64,
        duration: u64,
    ) -> Self {
        Self {
            guid,
            name,
            parent,
            timestamp,
            duration,
            category: SpanCategory::Generic,
            datastore: None,
            external: None,
        }
    }

    /// Fill in datastore fields from the segment's data hash.
    ///
    /// Host and port fall back to "unknown" in the joined peer address.
    /// Recording settings provide either `sql` or `sql_obfuscated`, never
    /// both; whichever is present becomes the statement. Missing fields
    /// stay absent, this never fails.
    pub fn populate_datastore(&mut self, data_hash: Option<&DataHash>, component: Option<&str>) {
        self.category = SpanCategory::Datastore;

        let host = hash_string(data_hash, "host");
        let port_path_or_id = hash_string(data_hash, "port_path_or_id");
        let address = format!(
            "{}:{}",
            host.as_deref().unwrap_or("unknown"),
            port_path_or_id.as_deref().unwrap_or("unknown")
        );

        self.datastore = Some(DatastoreSpanFields {
            component: component.map(str::to_owned),
            peer_hostname: host,
            peer_address: Some(address),
            db_instance: hash_string(data_hash, "database_name"),
            db_statement: hash_string(data_hash, "sql")
                .or_else(|| hash_string(data_hash, "sql_obfuscated")),
        });
    }

    /// Fill in external-call fields from the segment's data hash.
    pub fn populate_external(&mut self, data_hash: Option<&DataHash>) {
        self.category = SpanCategory::Http;
        self.external = Some(ExternalSpanFields {
            method: hash_string(data_hash, "procedure"),
            url: hash_string(data_hash, "uri"),
            component: hash_string(data_hash, "library"),
        });
    }
}

fn hash_string(hash: Option<&DataHash>, key: &str) -> Option<String> {
    hash?.get(key)?.as_str().map(str::to_owned)
}

/// Append-only span list with a fixed capacity.
///
/// Once full, further pushes are dropped and the walk carries on without
/// span output. Events are never reordered, so an event's index is stable
/// from the moment it is pushed.
#[derive(Debug, Default)]
pub struct SpanList {
    events: Vec<SpanEvent>,
    limit: usize,
}

impl SpanList {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit),
            limit,
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.events.len() < self.limit
    }

    /// Append an event and return its index, or `None` when full.
    pub fn push(&mut self, event: SpanEvent) -> Option<usize> {
        if !self.has_capacity() {
            return None;
        }
        self.events.push(event);
        Some(self.events.len() - 1)
    }

    pub fn events(&self) -> &[SpanEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<SpanEvent> {
        self.events
    }
}
