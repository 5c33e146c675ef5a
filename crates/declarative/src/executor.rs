//! Execution engine - converges and removes upsert-style resources

use crate::context::ApplyContext;
use crate::diff::drifted_fields;
use crate::resource::{GroupSource, Refresh, UpsertResource};
use crate::types::{ApplyResult, Outcome};
use runcloud_api::types::field_matches;
use runcloud_api::{Error, Record, Result, record_id};

/// Find the existing record whose natural key matches, scanning all pages
pub fn find_existing<R: UpsertResource + ?Sized>(
    ctx: &ApplyContext,
    resource: &R,
) -> Result<Option<Record>> {
    let records = ctx.client.fetch_all(&resource.collection())?;
    Ok(records
        .into_iter()
        .find(|record| field_matches(record, resource.key_field(), resource.key())))
}

fn required_id(record: &Record, kind: &str) -> Result<u64> {
    record_id(record).ok_or_else(|| Error::InvalidResponse(format!("{kind} record has no id")))
}

/// Converge one resource
///
/// Locates the record by natural key and creates it when absent. Then, in
/// order: the preparation hook, every drifted field group (one call each),
/// the links hook, and a refresh according to [`UpsertResource::refresh`].
pub fn converge<R: UpsertResource + ?Sized>(ctx: &ApplyContext, resource: &R) -> Result<Outcome> {
    let kind = resource.kind();
    let key = resource.key();

    let (mut result, mut record) = match find_existing(ctx, resource)? {
        Some(record) => {
            log::debug!("{kind} '{key}' exists");
            (ApplyResult::NoChange, record)
        }
        None => {
            log::info!("creating {kind} '{key}'");
            let created = ctx
                .client
                .post(&resource.create_path(), &resource.create_payload()?)?;
            (ApplyResult::Created, created)
        }
    };
    let id = required_id(&record, kind)?;

    if resource.prepare(ctx, id, &record)? {
        result = result.with_mutation();
    }

    let groups = if result == ApplyResult::Created && !resource.diff_after_create() {
        log::debug!("{kind} '{key}': created, skipping field groups");
        Vec::new()
    } else {
        resource.field_groups(id)
    };

    for group in groups {
        let observed = match &group.source {
            GroupSource::Record => record.clone(),
            GroupSource::Fetch(path) => ctx.client.get(path)?,
        };

        let drift = drifted_fields(&observed, &group.expected);
        if drift.is_empty() {
            log::debug!("{kind} '{key}': {} up to date", group.name);
            continue;
        }

        log::info!(
            "{kind} '{key}': updating {} ({})",
            group.name,
            drift.join(", ")
        );
        let response = ctx
            .client
            .request(group.method, &group.endpoint, Some(&group.payload))?;
        if group.replaces_record && response.is_object() {
            record = response;
        }
        result = result.with_mutation();
    }

    if resource.reconcile_links(ctx, id)? {
        result = result.with_mutation();
    }

    if resource.refresh() == Refresh::Always {
        record = ctx.client.get(&resource.member_path(id))?;
    }

    Ok(Outcome::new(result, record))
}

/// Remove one resource
///
/// Unsupported kinds fail before any request. An absent record is not an
/// error: it reports no change with an empty payload.
pub fn destroy<R: UpsertResource + ?Sized>(ctx: &ApplyContext, resource: &R) -> Result<Outcome> {
    let kind = resource.kind();
    if !resource.supports_delete() {
        return Err(Error::Unsupported {
            operation: "delete",
            kind,
        });
    }

    let Some(record) = find_existing(ctx, resource)? else {
        log::debug!("{kind} '{}' already absent", resource.key());
        return Ok(Outcome::empty());
    };
    let id = required_id(&record, kind)?;

    log::info!("deleting {kind} '{}'", resource.key());
    ctx.client.delete(&resource.member_path(id), None)?;
    Ok(Outcome::new(ApplyResult::Removed, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FieldGroup;
    use runcloud_api::{Client, Method, MockTransport};
    use serde_json::{Value, json};
    use std::cell::Cell;

    struct Widget {
        name: String,
        color: String,
        deletable: bool,
        refresh: Refresh,
        diff_after_create: bool,
        links_changed: Cell<bool>,
    }

    impl Widget {
        fn new(color: &str) -> Self {
            Self {
                name: "w1".into(),
                color: color.into(),
                deletable: true,
                refresh: Refresh::Never,
                diff_after_create: true,
                links_changed: Cell::new(false),
            }
        }
    }

    impl UpsertResource for Widget {
        fn kind(&self) -> &'static str {
            "widget"
        }

        fn collection(&self) -> String {
            "widgets".into()
        }

        fn key(&self) -> &str {
            &self.name
        }

        fn create_payload(&self) -> Result<Value> {
            Ok(json!({"name": self.name}))
        }

        fn field_groups(&self, id: u64) -> Vec<FieldGroup> {
            vec![
                FieldGroup::patch("color", format!("widgets/{id}/color"))
                    .field("color", self.color.as_str())
                    .payload(json!({"color": self.color})),
            ]
        }

        fn diff_after_create(&self) -> bool {
            self.diff_after_create
        }

        fn reconcile_links(&self, _ctx: &ApplyContext, _id: u64) -> Result<bool> {
            Ok(self.links_changed.get())
        }

        fn refresh(&self) -> Refresh {
            self.refresh
        }

        fn supports_delete(&self) -> bool {
            self.deletable
        }
    }

    fn client(mock: &MockTransport) -> Client {
        Client::with_transport(Box::new(mock.clone()))
    }

    #[test]
    fn test_converge_creates_then_patches_drift() {
        let mock = MockTransport::new();
        mock.collection("widgets", vec![]);
        mock.ok(Method::Post, "widgets", json!({"id": 9, "name": "w1", "color": "grey"}));
        mock.ok(Method::Patch, "widgets/9/color", json!({}));

        let client = client(&mock);
        let outcome = converge(&ApplyContext::new(&client), &Widget::new("red")).unwrap();

        assert_eq!(outcome.result, ApplyResult::Created);
        assert_eq!(outcome.data["id"], 9);
        let patches = mock.calls(Method::Patch, "widgets/9/color");
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].body, Some(json!({"color": "red"})));
    }

    #[test]
    fn test_converge_create_can_skip_field_groups() {
        let mock = MockTransport::new();
        mock.collection("widgets", vec![]);
        mock.ok(Method::Post, "widgets", json!({"id": 9, "name": "w1"}));

        let mut widget = Widget::new("red");
        widget.diff_after_create = false;
        let client = client(&mock);
        let outcome = converge(&ApplyContext::new(&client), &widget).unwrap();

        assert_eq!(outcome.result, ApplyResult::Created);
        assert_eq!(mock.mutations().len(), 1);
        assert!(mock.calls(Method::Patch, "widgets/9/color").is_empty());
    }

    #[test]
    fn test_converge_in_sync_makes_no_mutation() {
        let mock = MockTransport::new();
        mock.collection("widgets", vec![json!({"id": 9, "name": "w1", "color": "red"})]);

        let client = client(&mock);
        let outcome = converge(&ApplyContext::new(&client), &Widget::new("red")).unwrap();

        assert_eq!(outcome.result, ApplyResult::NoChange);
        assert!(mock.mutations().is_empty());
    }

    #[test]
    fn test_converge_drift_on_existing_is_modified_and_refreshes() {
        let mock = MockTransport::new();
        mock.collection("widgets", vec![json!({"id": 9, "name": "w1", "color": "blue"})]);
        mock.ok(Method::Patch, "widgets/9/color", json!({}));
        mock.ok(Method::Get, "widgets/9", json!({"id": 9, "name": "w1", "color": "red"}));

        let mut widget = Widget::new("red");
        widget.refresh = Refresh::Always;
        let client = client(&mock);
        let outcome = converge(&ApplyContext::new(&client), &widget).unwrap();

        assert_eq!(outcome.result, ApplyResult::Modified);
        assert_eq!(outcome.data["color"], "red");
        assert_eq!(mock.mutations().len(), 1);
    }

    #[test]
    fn test_links_change_marks_modified() {
        let mock = MockTransport::new();
        mock.collection("widgets", vec![json!({"id": 9, "name": "w1", "color": "red"})]);

        let widget = Widget::new("red");
        widget.links_changed.set(true);
        let client = client(&mock);
        let outcome = converge(&ApplyContext::new(&client), &widget).unwrap();
        assert_eq!(outcome.result, ApplyResult::Modified);
    }

    #[test]
    fn test_create_without_id_is_invalid_response() {
        let mock = MockTransport::new();
        mock.collection("widgets", vec![]);
        mock.ok(Method::Post, "widgets", json!({"name": "w1"}));

        let client = client(&mock);
        let err = converge(&ApplyContext::new(&client), &Widget::new("red")).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn test_destroy_present_deletes_once() {
        let mock = MockTransport::new();
        mock.collection("widgets", vec![json!({"id": 9, "name": "w1"})]);
        mock.ok(Method::Delete, "widgets/9", json!({}));

        let client = client(&mock);
        let outcome = destroy(&ApplyContext::new(&client), &Widget::new("red")).unwrap();

        assert_eq!(outcome.result, ApplyResult::Removed);
        assert_eq!(outcome.data["id"], 9);
        assert_eq!(mock.calls(Method::Delete, "widgets/9").len(), 1);
    }

    #[test]
    fn test_destroy_absent_is_no_change() {
        let mock = MockTransport::new();
        mock.collection("widgets", vec![json!({"id": 3, "name": "other"})]);

        let client = client(&mock);
        let outcome = destroy(&ApplyContext::new(&client), &Widget::new("red")).unwrap();

        assert_eq!(outcome, Outcome::empty());
        assert!(mock.mutations().is_empty());
    }

    #[test]
    fn test_destroy_unsupported_makes_no_request() {
        let mock = MockTransport::new();
        let mut widget = Widget::new("red");
        widget.deletable = false;

        let client = client(&mock);
        let err = destroy(&ApplyContext::new(&client), &widget).unwrap_err();

        assert!(matches!(err, Error::Unsupported { .. }));
        assert!(mock.requests().is_empty());
    }
}
