//! Name-to-id resolution.
//!
//! Users refer to servers, web applications and users by name; the API wants
//! numeric ids. A known id is trusted as-is.

use crate::error::{Error, Result};
use crate::pager::fetch_all;
use crate::transport::Transport;
use crate::types::{Lookup, field_id, field_matches};

/// Where and how to look up one kind of record.
#[derive(Debug, Clone, Copy)]
pub struct Collection<'a> {
    /// Human-readable kind, used in the not-found message.
    pub kind: &'a str,
    /// Collection path, e.g. `servers/12/users`.
    pub path: &'a str,
    /// Field holding the natural name.
    pub name_field: &'a str,
    /// Field holding the numeric id.
    pub id_field: &'a str,
}

impl<'a> Collection<'a> {
    /// A collection keyed by `name` and `id`.
    #[must_use]
    pub fn named(kind: &'a str, path: &'a str) -> Self {
        Self {
            kind,
            path,
            name_field: "name",
            id_field: "id",
        }
    }

    /// Use a different name field (e.g. `username`).
    #[must_use]
    pub fn name_field(mut self, name_field: &'a str) -> Self {
        self.name_field = name_field;
        self
    }
}

/// Resolve a [`Lookup`] to a numeric id.
///
/// - an id hint is returned without a request and without checking that the
///   record exists;
/// - a name hint scans the whole collection and returns the id of the first
///   record whose name matches;
/// - no match, or no hint at all, is [`Error::NotFound`].
pub fn resolve(transport: &dyn Transport, collection: Collection<'_>, lookup: &Lookup) -> Result<u64> {
    if let Some(id) = lookup.id {
        log::debug!("using {} id {} without lookup", collection.kind, id);
        return Ok(id);
    }

    let Some(name) = lookup.name.as_deref() else {
        return Err(Error::not_found(collection.kind));
    };

    let records = fetch_all(transport, collection.path)?;
    records
        .iter()
        .find(|record| field_matches(record, collection.name_field, name))
        .and_then(|record| field_id(record, collection.id_field))
        .inspect(|id| log::debug!("resolved {} '{}' to id {}", collection.kind, name, id))
        .ok_or_else(|| Error::not_found(collection.kind))
}
