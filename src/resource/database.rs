//! Database resource with user grants
//!
//! Grants are link records under the database whose `id` is the granted
//! database user's id. They are reconciled only when a user list is given.

use declarative::{ApplyContext, Outcome, Reconciler, SetDiff, UpsertResource, executor};
use runcloud_api::types::field_matches;
use runcloud_api::{Lookup, Result, record_id};
use serde_json::{Value, json};

use super::resolve_server;

pub const DEFAULT_COLLATION: &str = "utf8_danish_ci";

/// Desired state of a database
#[derive(Debug, Clone)]
pub struct Database {
    pub server: Lookup,
    pub name: String,
    pub collation: String,
    /// Database users that should hold grants; `None` leaves grants alone
    pub users: Option<Vec<String>>,
}

impl Database {
    pub fn new(server: Lookup, name: impl Into<String>) -> Self {
        Self {
            server,
            name: name.into(),
            collation: DEFAULT_COLLATION.to_string(),
            users: None,
        }
    }

    pub fn with_users(mut self, users: Vec<String>) -> Self {
        self.users = Some(users);
        self
    }

    fn bind(&self, ctx: &ApplyContext) -> Result<BoundDatabase<'_>> {
        Ok(BoundDatabase {
            desired: self,
            server_id: resolve_server(ctx, &self.server)?,
        })
    }
}

struct BoundDatabase<'a> {
    desired: &'a Database,
    server_id: u64,
}

impl BoundDatabase<'_> {
    /// Ids of the server's database users named in `usernames`
    ///
    /// Names with no matching user are skipped.
    fn desired_grants(&self, ctx: &ApplyContext, usernames: &[String]) -> Result<Vec<u64>> {
        let users = ctx
            .client
            .fetch_all(&format!("servers/{}/databaseusers", self.server_id))?;

        let mut ids = Vec::with_capacity(usernames.len());
        for username in usernames {
            match users
                .iter()
                .find(|user| field_matches(user, "username", username))
                .and_then(record_id)
            {
                Some(id) => ids.push(id),
                None => log::warn!(
                    "database user '{username}' not found on server {}; not granting it",
                    self.server_id
                ),
            }
        }
        Ok(ids)
    }
}

impl UpsertResource for BoundDatabase<'_> {
    fn kind(&self) -> &'static str {
        "database"
    }

    fn collection(&self) -> String {
        format!("servers/{}/databases", self.server_id)
    }

    fn key(&self) -> &str {
        &self.desired.name
    }

    fn create_payload(&self) -> Result<Value> {
        Ok(json!({
            "name": self.desired.name,
            "collation": self.desired.collation,
        }))
    }

    fn reconcile_links(&self, ctx: &ApplyContext, id: u64) -> Result<bool> {
        let Some(usernames) = &self.desired.users else {
            return Ok(false);
        };

        let desired = self.desired_grants(ctx, usernames)?;
        let grant_path = format!("{}/{id}/grant", self.collection());
        let observed: Vec<u64> = ctx
            .client
            .fetch_all(&grant_path)?
            .iter()
            .filter_map(record_id)
            .collect();

        let diff = SetDiff::compute(&desired, &observed);
        for user_id in &diff.to_add {
            log::info!("granting database user {user_id} on '{}'", self.desired.name);
            ctx.client.post(&grant_path, &json!({ "id": user_id }))?;
        }
        for user_id in &diff.to_remove {
            log::info!("revoking database user {user_id} on '{}'", self.desired.name);
            ctx.client
                .delete(&grant_path, Some(&json!({ "id": user_id })))?;
        }

        Ok(!diff.is_empty())
    }
}

impl Reconciler for Database {
    fn kind(&self) -> &'static str {
        "database"
    }

    fn converge(&self, ctx: &ApplyContext) -> Result<Outcome> {
        executor::converge(ctx, &self.bind(ctx)?)
    }

    fn destroy(&self, ctx: &ApplyContext) -> Result<Outcome> {
        executor::destroy(ctx, &self.bind(ctx)?)
    }
}
