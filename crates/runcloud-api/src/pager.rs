//! Collection pagination.
//!
//! List endpoints wrap their records in an envelope:
//!
//! ```json
//! { "data": [...], "meta": { "pagination": { "current_page": 1, "total_pages": 3 } } }
//! ```
//!
//! [`fetch_all`] walks every page and returns one flat list.

use crate::error::Result;
use crate::transport::{Method, Transport};
use crate::types::Record;
use serde_json::Value;

/// Fetch every record of a collection, in page order.
///
/// Missing pagination counters default to 1 (a single page). Any failed page
/// aborts the whole fetch.
pub fn fetch_all(transport: &dyn Transport, path: &str) -> Result<Vec<Record>> {
    let first = transport
        .send(Method::Get, path, None)?
        .into_success(Method::Get, path)?;

    let (mut current_page, total_pages) = pagination(&first);
    let mut records = page_data(first);

    while current_page < total_pages {
        current_page += 1;
        let page_path = page_path(path, current_page);
        log::debug!("fetching page {}/{} of {}", current_page, total_pages, path);
        let page = transport
            .send(Method::Get, &page_path, None)?
            .into_success(Method::Get, &page_path)?;
        records.extend(page_data(page));
    }

    Ok(records)
}

/// Read `(current_page, total_pages)` from an envelope.
fn pagination(envelope: &Value) -> (u64, u64) {
    let pagination = envelope.pointer("/meta/pagination");
    let read = |key: &str| {
        pagination
            .and_then(|p| p.get(key))
            .and_then(Value::as_u64)
            .unwrap_or(1)
    };
    (read("current_page"), read("total_pages"))
}

/// Take the `data` array out of an envelope.
fn page_data(mut envelope: Value) -> Vec<Record> {
    match envelope.get_mut("data").map(Value::take) {
        Some(Value::Array(records)) => records,
        _ => Vec::new(),
    }
}

/// Append the page query parameter to a collection path.
fn page_path(path: &str, page: u64) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}page={page}")
}
