//! Database users and system users
//!
//! Both are plain `username` + `password` records under a server. The
//! password is write-only: it is sent on creation and never compared.

use declarative::{ApplyContext, Outcome, Reconciler, UpsertResource, executor};
use runcloud_api::{Error, Lookup, Result};
use serde_json::{Value, json};

use super::resolve_server;

/// Which kind of account a [`Account`] manages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccountKind {
    Database,
    System,
}

impl AccountKind {
    fn kind(self) -> &'static str {
        match self {
            Self::Database => "database_user",
            Self::System => "system_user",
        }
    }

    fn segment(self) -> &'static str {
        match self {
            Self::Database => "databaseusers",
            Self::System => "users",
        }
    }
}

#[derive(Debug, Clone)]
struct Account {
    account: AccountKind,
    server: Lookup,
    username: String,
    password: Option<String>,
}

impl Account {
    fn bind(&self, ctx: &ApplyContext) -> Result<BoundAccount<'_>> {
        Ok(BoundAccount {
            desired: self,
            server_id: resolve_server(ctx, &self.server)?,
        })
    }

    fn converge(&self, ctx: &ApplyContext) -> Result<Outcome> {
        executor::converge(ctx, &self.bind(ctx)?)
    }

    fn destroy(&self, ctx: &ApplyContext) -> Result<Outcome> {
        executor::destroy(ctx, &self.bind(ctx)?)
    }
}

struct BoundAccount<'a> {
    desired: &'a Account,
    server_id: u64,
}

impl UpsertResource for BoundAccount<'_> {
    fn kind(&self) -> &'static str {
        self.desired.account.kind()
    }

    fn collection(&self) -> String {
        format!("servers/{}/{}", self.server_id, self.desired.account.segment())
    }

    fn key_field(&self) -> &'static str {
        "username"
    }

    fn key(&self) -> &str {
        &self.desired.username
    }

    fn create_payload(&self) -> Result<Value> {
        let password = self
            .desired
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::Validation {
                field: "password",
                value: String::new(),
                expected: format!("a password to create {}", self.desired.username),
            })?;
        Ok(json!({
            "username": self.desired.username,
            "password": password,
        }))
    }
}

/// Desired state of a database user
#[derive(Debug, Clone)]
pub struct DatabaseUser(Account);

impl DatabaseUser {
    pub fn new(server: Lookup, username: impl Into<String>, password: Option<String>) -> Self {
        Self(Account {
            account: AccountKind::Database,
            server,
            username: username.into(),
            password,
        })
    }
}

impl Reconciler for DatabaseUser {
    fn kind(&self) -> &'static str {
        self.0.account.kind()
    }

    fn converge(&self, ctx: &ApplyContext) -> Result<Outcome> {
        self.0.converge(ctx)
    }

    fn destroy(&self, ctx: &ApplyContext) -> Result<Outcome> {
        self.0.destroy(ctx)
    }
}

/// Desired state of a system (Linux) user
#[derive(Debug, Clone)]
pub struct SystemUser(Account);

impl SystemUser {
    pub fn new(server: Lookup, username: impl Into<String>, password: Option<String>) -> Self {
        Self(Account {
            account: AccountKind::System,
            server,
            username: username.into(),
            password,
        })
    }
}

impl Reconciler for SystemUser {
    fn kind(&self) -> &'static str {
        self.0.account.kind()
    }

    fn converge(&self, ctx: &ApplyContext) -> Result<Outcome> {
        self.0.converge(ctx)
    }

    fn destroy(&self, ctx: &ApplyContext) -> Result<Outcome> {
        self.0.destroy(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::{bodies, client};
    use declarative::ApplyResult;
    use runcloud_api::{Method, MockTransport};

    fn mock(users_path: &str, users: Vec<Value>) -> MockTransport {
        let mock = MockTransport::new();
        mock.collection("servers", vec![json!({"id": 1, "name": "web-1"})]);
        mock.collection(users_path, users);
        mock
    }

    #[test]
    fn test_create_database_user() {
        let mock = mock("servers/1/databaseusers", vec![]);
        mock.ok(
            Method::Post,
            "servers/1/databaseusers",
            json!({"id": 59, "username": "db_user"}),
        );
        let client = client(&mock);

        let user = DatabaseUser::new(Lookup::by_name("web-1"), "db_user", Some("s3cret".into()));
        let outcome = user.converge(&ApplyContext::new(&client)).unwrap();

        assert_eq!(outcome.result, ApplyResult::Created);
        assert_eq!(
            bodies(&mock, Method::Post, "servers/1/databaseusers"),
            vec![json!({"username": "db_user", "password": "s3cret"})]
        );
        assert_eq!(
            outcome.report(user.kind())["data"]["database_user"]["id"],
            59
        );
    }

    #[test]
    fn test_existing_user_ignores_password() {
        let mock = mock("servers/1/users", vec![json!({"id": 5, "username": "alice"})]);
        let client = client(&mock);

        let user = SystemUser::new(Lookup::by_id(1), "alice", Some("other".into()));
        let outcome = user.converge(&ApplyContext::new(&client)).unwrap();

        assert_eq!(outcome.result, ApplyResult::NoChange);
        assert!(mock.mutations().is_empty());
        assert!(mock.calls(Method::Get, "servers").is_empty());
    }

    #[test]
    fn test_create_without_password_is_validation_error() {
        let mock = mock("servers/1/users", vec![]);
        let client = client(&mock);

        let user = SystemUser::new(Lookup::by_name("web-1"), "alice", None);
        let err = user.converge(&ApplyContext::new(&client)).unwrap_err();

        assert!(matches!(err, Error::Validation { field: "password", .. }));
        assert!(mock.mutations().is_empty());
    }

    #[test]
    fn test_destroy_system_user() {
        let mock = mock("servers/1/users", vec![json!({"id": 5, "username": "alice"})]);
        mock.ok(Method::Delete, "servers/1/users/5", json!({}));
        let client = client(&mock);

        let user = SystemUser::new(Lookup::by_name("web-1"), "alice", None);
        let outcome = user.destroy(&ApplyContext::new(&client)).unwrap();

        assert_eq!(outcome.result, ApplyResult::Removed);
        assert_eq!(mock.calls(Method::Delete, "servers/1/users/5").len(), 1);
    }

    #[test]
    fn test_destroy_absent_database_user() {
        let mock = mock("servers/1/databaseusers", vec![]);
        let client = client(&mock);

        let user = DatabaseUser::new(Lookup::by_name("web-1"), "ghost", None);
        let outcome = user.destroy(&ApplyContext::new(&client)).unwrap();

        assert_eq!(outcome.report("database_user"), json!({"changed": false, "data": {}}));
        assert!(mock.mutations().is_empty());
    }
}
