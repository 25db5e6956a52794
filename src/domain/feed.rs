//! Feed snapshots as delivered by the upstream source.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::DomainError;

const MAX_RESOURCE_ID_LEN: usize = 128;

/// Opaque identifier of a feed (a show, a channel, ...).
///
/// Shared by the generation store and every cache key, so it is validated
/// once at the edge and cheap to clone afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.is_empty() {
            return Err(DomainError::validation("resource id must not be empty"));
        }
        if raw.len() > MAX_RESOURCE_ID_LEN {
            return Err(DomainError::validation(format!(
                "resource id exceeds {MAX_RESOURCE_ID_LEN} characters"
            )));
        }
        if raw.starts_with(['_', '.']) {
            return Err(DomainError::validation(
                "resource id must not start with `_` or `.`",
            ));
        }
        if let Some(invalid) = raw
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')))
        {
            return Err(DomainError::validation(format!(
                "resource id contains unsupported character `{invalid}`"
            )));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a feed.
///
/// Only `id` (and optionally `slug`) mean anything to this service; the rest
/// of the upstream fields ride along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl FeedItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: None,
            fields: Map::new(),
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Full, ordered content of a feed at the time it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<FeedItem>,
}

impl FeedSnapshot {
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Look an item up by id first, then by slug.
    pub fn find_item(&self, id_or_slug: &str) -> Option<&FeedItem> {
        self.items
            .iter()
            .find(|item| item.id == id_or_slug)
            .or_else(|| {
                self.items
                    .iter()
                    .find(|item| item.slug.as_deref() == Some(id_or_slug))
            })
    }
}
