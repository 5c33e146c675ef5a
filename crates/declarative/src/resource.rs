//! Resource traits for declarative state management
//!
//! A [`Reconciler`] is anything that can be converged to, or removed from,
//! the remote account. Most RunCloud resources follow the same shape (find
//! by natural key, create if absent, then patch groups of settings), which
//! [`UpsertResource`] captures so [`crate::executor`] can drive it.

use crate::context::ApplyContext;
use crate::types::{DesiredState, Outcome};
use runcloud_api::{Method, Record, Result};
use serde_json::Value;

/// Core trait for declarative resources
///
/// # Example
///
/// ```ignore
/// use declarative::{ApplyContext, Outcome, Reconciler};
///
/// struct Tag { name: String }
///
/// impl Reconciler for Tag {
///     fn kind(&self) -> &'static str {
///         "tag"
///     }
///
///     fn converge(&self, ctx: &ApplyContext) -> runcloud_api::Result<Outcome> {
///         declarative::executor::converge(ctx, &BoundTag::new(self))
///     }
///
///     fn destroy(&self, ctx: &ApplyContext) -> runcloud_api::Result<Outcome> {
///         declarative::executor::destroy(ctx, &BoundTag::new(self))
///     }
/// }
/// ```
pub trait Reconciler {
    /// Resource kind, also the key of the reported record
    fn kind(&self) -> &'static str;

    /// Make the remote resource exist with the desired settings
    fn converge(&self, ctx: &ApplyContext) -> Result<Outcome>;

    /// Make the remote resource not exist
    fn destroy(&self, ctx: &ApplyContext) -> Result<Outcome>;

    /// Dispatch on the desired state
    fn apply(&self, ctx: &ApplyContext, state: DesiredState) -> Result<Outcome> {
        match state {
            DesiredState::Present => self.converge(ctx),
            DesiredState::Absent => self.destroy(ctx),
        }
    }
}

/// When to re-read the record after converging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Always `GET` the member path at the end
    Always,
    /// Report whatever was last seen
    Never,
}

/// Where a field group reads its observed values from
#[derive(Debug, Clone, PartialEq)]
pub enum GroupSource {
    /// The resource record itself
    Record,
    /// A settings sub-resource fetched with `GET`
    Fetch(String),
}

/// A set of settings updated together by one call
///
/// If any expected field drifts, the whole payload is sent once with
/// `method` to `endpoint`.
#[derive(Debug, Clone)]
pub struct FieldGroup {
    /// Label used in logs
    pub name: &'static str,
    /// Where observed values are read from
    pub source: GroupSource,
    /// Observed field names and the values they should hold
    pub expected: Vec<(&'static str, Value)>,
    /// Update method, `PATCH` unless overridden
    pub method: Method,
    /// Update path
    pub endpoint: String,
    /// Body sent when any expected field drifts
    pub payload: Value,
    /// The call's response becomes the new record
    pub replaces_record: bool,
}

impl FieldGroup {
    /// A group observed on the record and updated with `PATCH`
    pub fn patch(name: &'static str, endpoint: impl Into<String>) -> Self {
        Self {
            name,
            source: GroupSource::Record,
            expected: Vec::new(),
            method: Method::Patch,
            endpoint: endpoint.into(),
            payload: Value::Object(serde_json::Map::new()),
            replaces_record: false,
        }
    }

    /// Read observed values from a sub-resource instead of the record
    pub fn fetched_from(mut self, path: impl Into<String>) -> Self {
        self.source = GroupSource::Fetch(path.into());
        self
    }

    /// Use a different update method
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Compare `field` on the observed side against `value`
    pub fn field(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.expected.push((field, value.into()));
        self
    }

    /// Payload sent on drift
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Replace the record with the update response
    pub fn replaces_record(mut self) -> Self {
        self.replaces_record = true;
        self
    }
}

/// Strategy for resources living in a collection under a natural key
///
/// Implementors have all parent ids resolved, so paths are plain strings.
pub trait UpsertResource {
    /// Resource kind, used in logs and errors
    fn kind(&self) -> &'static str;

    /// Collection path listing the existing resources
    fn collection(&self) -> String;

    /// Field holding the natural key
    fn key_field(&self) -> &'static str {
        "name"
    }

    /// Natural key of the desired resource
    fn key(&self) -> &str;

    /// Path to `POST` the creation payload to
    fn create_path(&self) -> String {
        self.collection()
    }

    /// Body for creating the resource
    fn create_payload(&self) -> Result<Value>;

    /// Path of one existing resource
    fn member_path(&self, id: u64) -> String {
        format!("{}/{}", self.collection(), id)
    }

    /// Settings checked and updated after the record is located or created
    fn field_groups(&self, _id: u64) -> Vec<FieldGroup> {
        Vec::new()
    }

    /// Whether field groups are checked against a freshly created record
    ///
    /// Resources whose create payload already carries every setting, and
    /// whose update call would create again, return `false`.
    fn diff_after_create(&self) -> bool {
        true
    }

    /// Runs once the record exists, before field groups
    ///
    /// Returns whether anything changed.
    fn prepare(&self, _ctx: &ApplyContext, _id: u64, _record: &Record) -> Result<bool> {
        Ok(false)
    }

    /// Runs after field groups, for membership such as grants
    ///
    /// Returns whether anything changed.
    fn reconcile_links(&self, _ctx: &ApplyContext, _id: u64) -> Result<bool> {
        Ok(false)
    }

    /// Whether to re-read the member record at the end of a converge
    fn refresh(&self) -> Refresh {
        Refresh::Never
    }

    /// Whether the API offers deletion for this kind
    fn supports_delete(&self) -> bool {
        true
    }
}
