//! Server resource - register a machine and keep its settings in line
//!
//! Servers are matched by IP address. A server that has not connected yet
//! gets the agent installation script run on this machine.

use declarative::{
    ApplyContext, FieldGroup, Outcome, Reconciler, Refresh, UpsertResource, executor,
};
use runcloud_api::{Error, Record, Result};
use serde_json::{Value, json};

use super::PhpVersion;

pub const DEFAULT_PROVIDER: &str = "digitalocean";

/// SSH daemon settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SshSettings {
    pub passwordless_login: bool,
    pub use_dns: bool,
    pub prevent_root_login: bool,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            passwordless_login: false,
            use_dns: false,
            prevent_root_login: true,
        }
    }
}

/// Unattended upgrade settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoUpdate {
    pub software_update: bool,
    pub security_update: bool,
}

impl Default for AutoUpdate {
    fn default() -> Self {
        Self {
            software_update: false,
            security_update: true,
        }
    }
}

/// Desired state of a server
#[derive(Debug, Clone)]
pub struct Server {
    pub name: String,
    pub ip_address: String,
    pub provider: String,
    pub php_version: PhpVersion,
    pub ssh: SshSettings,
    pub auto_update: AutoUpdate,
    /// Run the agent installation script when the server is not connected
    pub install_script: bool,
}

impl Server {
    pub fn new(
        name: impl Into<String>,
        ip_address: impl Into<String>,
        php_version: PhpVersion,
    ) -> Self {
        Self {
            name: name.into(),
            ip_address: ip_address.into(),
            provider: DEFAULT_PROVIDER.to_string(),
            php_version,
            ssh: SshSettings::default(),
            auto_update: AutoUpdate::default(),
            install_script: true,
        }
    }

    fn is_disconnected(record: &Record) -> bool {
        match record.get("connected") {
            Some(Value::Bool(connected)) => !connected,
            Some(Value::Number(n)) => n.as_i64() == Some(0),
            _ => false,
        }
    }

    fn install_agent(&self, ctx: &ApplyContext, id: u64) -> Result<()> {
        let path = format!("servers/{id}/installationscript");
        let response = ctx.client.get(&path)?;
        let script = response
            .get("script")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidResponse(format!("{path} returned no script")))?;

        log::info!("running installation script for server '{}'", self.name);
        ctx.runner.run_checked(script)?;
        Ok(())
    }
}

impl UpsertResource for Server {
    fn kind(&self) -> &'static str {
        "server"
    }

    fn collection(&self) -> String {
        "servers".to_string()
    }

    fn key_field(&self) -> &'static str {
        "ipAddress"
    }

    fn key(&self) -> &str {
        &self.ip_address
    }

    fn create_payload(&self) -> Result<Value> {
        Ok(json!({
            "name": self.name,
            "ipAddress": self.ip_address,
            "provider": self.provider,
        }))
    }

    fn prepare(&self, ctx: &ApplyContext, id: u64, record: &Record) -> Result<bool> {
        if !Self::is_disconnected(record) {
            return Ok(false);
        }
        if !self.install_script {
            log::warn!(
                "server '{}' is not connected; skipping installation script",
                self.name
            );
            return Ok(false);
        }
        self.install_agent(ctx, id)?;
        Ok(true)
    }

    fn field_groups(&self, id: u64) -> Vec<FieldGroup> {
        let ssh_path = format!("servers/{id}/settings/ssh");
        let runtime = self.php_version.runtime();

        vec![
            FieldGroup::patch("php cli", format!("servers/{id}/php/cli"))
                .field("phpCLIVersion", runtime)
                .payload(json!({ "phpVersion": runtime })),
            FieldGroup::patch("ssh", ssh_path.clone())
                .fetched_from(ssh_path)
                .field("passwordlessLogin", self.ssh.passwordless_login)
                .field("useDns", self.ssh.use_dns)
                .field("preventRootLogin", self.ssh.prevent_root_login)
                .payload(json!({
                    "passwordlessLogin": self.ssh.passwordless_login,
                    "useDns": self.ssh.use_dns,
                    "preventRootLogin": self.ssh.prevent_root_login,
                })),
            FieldGroup::patch("meta", format!("servers/{id}/settings/meta"))
                .field("name", self.name.as_str())
                .field("provider", self.provider.as_str())
                .payload(json!({
                    "name": self.name,
                    "provider": self.provider,
                })),
            FieldGroup::patch("auto update", format!("servers/{id}/settings/autoupdate"))
                .field("softwareUpdate", self.auto_update.software_update)
                .field("securityUpdate", self.auto_update.security_update)
                .payload(json!({
                    "softwareUpdate": self.auto_update.software_update,
                    "securityUpdate": self.auto_update.security_update,
                })),
        ]
    }

    fn refresh(&self) -> Refresh {
        Refresh::Always
    }

    fn supports_delete(&self) -> bool {
        false
    }
}

impl Reconciler for Server {
    fn kind(&self) -> &'static str {
        "server"
    }

    fn converge(&self, ctx: &ApplyContext) -> Result<Outcome> {
        executor::converge(ctx, self)
    }

    fn destroy(&self, ctx: &ApplyContext) -> Result<Outcome> {
        executor::destroy(ctx, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::{bodies, client};
    use declarative::{ApplyResult, MockRunner};
    use runcloud_api::{Method, MockTransport};

    fn desired() -> Server {
        Server::new("web-1", "10.0.0.1", PhpVersion::Php81)
    }

    fn converged_record() -> Value {
        json!({
            "id": 1,
            "name": "web-1",
            "ipAddress": "10.0.0.1",
            "provider": "digitalocean",
            "connected": true,
            "phpCLIVersion": "php81rc",
            "softwareUpdate": false,
            "securityUpdate": 1,
        })
    }

    fn mock_with(record: Value) -> MockTransport {
        let mock = MockTransport::new();
        mock.collection("servers", vec![record]);
        mock.ok(
            Method::Get,
            "servers/1/settings/ssh",
            json!({"passwordlessLogin": 0, "useDns": 0, "preventRootLogin": 1}),
        );
        mock.ok(Method::Get, "servers/1", converged_record());
        mock
    }

    fn converged_mock() -> MockTransport {
        mock_with(converged_record())
    }

    #[test]
    fn test_converged_server_is_unchanged() {
        let mock = converged_mock();
        let client = client(&mock);

        let outcome = desired().converge(&ApplyContext::new(&client)).unwrap();

        assert_eq!(outcome.result, ApplyResult::NoChange);
        assert!(mock.mutations().is_empty());
        assert_eq!(mock.calls(Method::Get, "servers/1").len(), 1);
    }

    #[test]
    fn test_converge_twice_is_idempotent() {
        let mut stale = converged_record();
        stale["phpCLIVersion"] = json!("php74rc");
        let mock = MockTransport::new();
        mock.collection("servers", vec![stale]);
        mock.collection("servers", vec![converged_record()]);
        mock.ok(
            Method::Get,
            "servers/1/settings/ssh",
            json!({"passwordlessLogin": 0, "useDns": 1, "preventRootLogin": 1}),
        );
        mock.ok(
            Method::Get,
            "servers/1/settings/ssh",
            json!({"passwordlessLogin": 0, "useDns": 0, "preventRootLogin": 1}),
        );
        mock.ok(Method::Patch, "servers/1/php/cli", json!({}));
        mock.ok(Method::Patch, "servers/1/settings/ssh", json!({}));
        mock.ok(Method::Get, "servers/1", converged_record());
        let client = client(&mock);
        let ctx = ApplyContext::new(&client);

        let first = desired().converge(&ctx).unwrap();
        assert_eq!(first.result, ApplyResult::Modified);
        assert_eq!(mock.mutations().len(), 2);

        mock.clear_requests();
        let second = desired().converge(&ctx).unwrap();
        assert!(!second.changed());
        assert!(mock.mutations().is_empty());
        assert_eq!(first.data, second.data);
    }

    #[test]
    fn test_only_drifted_group_is_patched() {
        let mock = converged_mock();
        mock.ok(Method::Patch, "servers/1/settings/ssh", json!({}));
        let client = client(&mock);

        let mut server = desired();
        server.ssh.use_dns = true;
        let outcome = server.converge(&ApplyContext::new(&client)).unwrap();

        assert_eq!(outcome.result, ApplyResult::Modified);
        let mutations = mock.mutations();
        assert_eq!(mutations.len(), 1);
        assert_eq!(mutations[0].path, "servers/1/settings/ssh");
        assert_eq!(
            mutations[0].body,
            Some(json!({"passwordlessLogin": false, "useDns": true, "preventRootLogin": true}))
        );
    }

    #[test]
    fn test_php_cli_version_patch() {
        let mock = converged_mock();
        mock.ok(Method::Patch, "servers/1/php/cli", json!({}));
        let client = client(&mock);

        let mut server = desired();
        server.php_version = PhpVersion::Php83;
        server.converge(&ApplyContext::new(&client)).unwrap();

        assert_eq!(
            bodies(&mock, Method::Patch, "servers/1/php/cli"),
            vec![json!({"phpVersion": "php83rc"})]
        );
        assert_eq!(mock.mutations().len(), 1);
    }

    #[test]
    fn test_new_server_runs_installation_script() {
        let mock = MockTransport::new();
        mock.collection("servers", vec![]);
        let mut created = converged_record();
        created["connected"] = json!(false);
        mock.ok(Method::Post, "servers", created);
        mock.ok(
            Method::Get,
            "servers/1/installationscript",
            json!({"script": "curl -s https://example.invalid/install | bash"}),
        );
        mock.ok(
            Method::Get,
            "servers/1/settings/ssh",
            json!({"passwordlessLogin": false, "useDns": false, "preventRootLogin": true}),
        );
        mock.ok(Method::Get, "servers/1", converged_record());

        let client = client(&mock);
        let runner = MockRunner::new();
        let ctx = ApplyContext::with_runner(&client, &runner);
        let outcome = desired().converge(&ctx).unwrap();

        assert_eq!(outcome.result, ApplyResult::Created);
        assert_eq!(
            bodies(&mock, Method::Post, "servers"),
            vec![json!({"name": "web-1", "ipAddress": "10.0.0.1", "provider": "digitalocean"})]
        );
        assert_eq!(runner.scripts().len(), 1);
        assert_eq!(mock.mutations().len(), 1);
        assert_eq!(outcome.data["connected"], true);
    }

    #[test]
    fn test_disconnected_without_install_is_skipped() {
        let mut record = converged_record();
        record["connected"] = json!(false);
        let mock = mock_with(record);

        let client = client(&mock);
        let runner = MockRunner::new();
        let mut server = desired();
        server.install_script = false;
        let outcome = server
            .converge(&ApplyContext::with_runner(&client, &runner))
            .unwrap();

        assert!(!outcome.changed());
        assert!(runner.scripts().is_empty());
        assert!(mock.calls(Method::Get, "servers/1/installationscript").is_empty());
    }

    #[test]
    fn test_failed_installation_script_aborts() {
        let mut record = converged_record();
        record["connected"] = json!(0);
        let mock = mock_with(record);
        mock.ok(
            Method::Get,
            "servers/1/installationscript",
            json!({"script": "bash install.sh"}),
        );

        let client = client(&mock);
        let runner = MockRunner::failing();
        let err = desired()
            .converge(&ApplyContext::with_runner(&client, &runner))
            .unwrap_err();

        assert!(matches!(err, Error::Command(_)));
        assert!(mock.mutations().is_empty());
    }

    #[test]
    fn test_destroy_is_unsupported_without_requests() {
        let mock = MockTransport::new();
        let client = client(&mock);

        let err = desired().destroy(&ApplyContext::new(&client)).unwrap_err();

        assert!(matches!(err, Error::Unsupported { kind: "server", .. }));
        assert!(mock.requests().is_empty());
    }
}
