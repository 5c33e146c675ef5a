//! Web application resource
//!
//! Applications are created with the full settings bag. An application that
//! already exists under the same name is reported as converged: its settings
//! are not compared.

use declarative::{ApplyContext, Outcome, Reconciler, UpsertResource, executor};
use runcloud_api::resolver::Collection;
use runcloud_api::{Error, Lookup, Result};
use serde_json::{Value, json};

use super::{Existing, PhpVersion, choice, resolve_server, webapps_path};

pub const DEFAULT_DISABLE_FUNCTIONS: &str = "getmyuid,passthru,leak,listen,diskfreespace,tmpfile,link,ignore_user_abort,shell_exec,dl,set_time_limit,exec,system,highlight_file,source,show_source,fpassthru,virtual,posix_ctermid,posix_getcwd,posix_getegid,posix_geteuid,posix_getgid,posix_getgrgid,posix_getgrnam,posix_getgroups,posix_getlogin,posix_getpgid,posix_getpgrp,posix_getpid,posix_getppid,posix_getpwuid,posix_getrlimit,posix_getsid,posix_getuid,posix_isatty,posix_kill,posix_mkfifo,posix_setegid,posix_seteuid,posix_setgid,posix_setpgid,posix_setsid,posix_setuid,posix_times,posix_ttyname,posix_uname,proc_open,proc_close,proc_nice,proc_terminate,escapeshellcmd,ini_alter,popen,pcntl_exec,socket_accept,socket_bind,socket_clear_error,socket_close,socket_connect,symlink,posix_geteuid,ini_alter,socket_listen,socket_create_listen,socket_read,socket_create_pair,stream_socket_server";

choice! {
    /// Web server stack
    Stack, "stack" {
        Hybrid => "hybrid",
        NativeNginx => "nativenginx",
        CustomNginx => "customnginx",
    }
}

choice! {
    StackMode, "stack_mode" {
        Production => "production",
        Development => "development",
    }
}

choice! {
    /// PHP-FPM process manager
    ProcessManager, "process_manager" {
        Dynamic => "dynamic",
        OnDemand => "ondemand",
        Static => "static",
    }
}

/// PHP-FPM pool sizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FpmSettings {
    pub process_manager: ProcessManager,
    pub start_servers: u32,
    pub min_spare_servers: u32,
    pub max_spare_servers: u32,
    pub max_children: u32,
    pub max_requests: u32,
}

impl Default for FpmSettings {
    fn default() -> Self {
        Self {
            process_manager: ProcessManager::Dynamic,
            start_servers: 1,
            min_spare_servers: 1,
            max_spare_servers: 1,
            max_children: 5,
            max_requests: 500,
        }
    }
}

/// php.ini overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpSettings {
    /// Defaults to the owner's webapp directory plus session and tmp dirs
    pub open_basedir: Option<String>,
    pub timezone: String,
    pub disable_functions: String,
    pub max_execution_time: u32,
    pub max_input_time: u32,
    pub max_input_vars: u32,
    pub memory_limit: u32,
    pub post_max_size: u32,
    pub upload_max_filesize: u32,
    pub session_gc_maxlifetime: u32,
    pub allow_url_fopen: bool,
}

impl Default for PhpSettings {
    fn default() -> Self {
        Self {
            open_basedir: None,
            timezone: "UTC".to_string(),
            disable_functions: DEFAULT_DISABLE_FUNCTIONS.to_string(),
            max_execution_time: 30,
            max_input_time: 60,
            max_input_vars: 1000,
            memory_limit: 256,
            post_max_size: 256,
            upload_max_filesize: 256,
            session_gc_maxlifetime: 256,
            allow_url_fopen: true,
        }
    }
}

/// Response header protections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityHeaders {
    pub clickjacking_protection: bool,
    pub xss_protection: bool,
    pub mime_sniffing_protection: bool,
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self {
            clickjacking_protection: true,
            xss_protection: true,
            mime_sniffing_protection: true,
        }
    }
}

/// Desired state of a web application
#[derive(Debug, Clone)]
pub struct WebApplication {
    pub server: Lookup,
    /// Owning system user
    pub owner: Lookup,
    pub name: String,
    pub domain_name: String,
    pub public_path: Option<String>,
    pub php_version: PhpVersion,
    pub stack: Stack,
    pub stack_mode: StackMode,
    pub headers: SecurityHeaders,
    pub fpm: FpmSettings,
    pub php: PhpSettings,
}

impl WebApplication {
    pub fn new(
        server: Lookup,
        owner: Lookup,
        name: impl Into<String>,
        domain_name: impl Into<String>,
        php_version: PhpVersion,
    ) -> Self {
        Self {
            server,
            owner,
            name: name.into(),
            domain_name: domain_name.into(),
            public_path: None,
            php_version,
            stack: Stack::Hybrid,
            stack_mode: StackMode::Production,
            headers: SecurityHeaders::default(),
            fpm: FpmSettings::default(),
            php: PhpSettings::default(),
        }
    }

    fn bind(&self, ctx: &ApplyContext) -> Result<BoundWebApplication<'_>> {
        let server_id = resolve_server(ctx, &self.server)?;
        let users_path = format!("servers/{server_id}/users");
        let owner_id = ctx.client.resolve(
            Collection::named("system user", &users_path).name_field("username"),
            &self.owner,
        )?;

        let open_basedir = match &self.php.open_basedir {
            Some(dirs) => dirs.clone(),
            None => {
                let username = self.owner_username(ctx, server_id, owner_id)?;
                format!(
                    "/home/{username}/webapps/{}:/var/lib/php/session:/tmp",
                    self.name
                )
            }
        };

        Ok(BoundWebApplication {
            desired: self,
            server_id,
            owner_id,
            open_basedir,
        })
    }

    /// Username of the resolved owner; a name hint only counts when no id was given
    fn owner_username(&self, ctx: &ApplyContext, server_id: u64, owner_id: u64) -> Result<String> {
        if let (None, Some(name)) = (self.owner.id, &self.owner.name) {
            return Ok(name.clone());
        }
        let path = format!("servers/{server_id}/users/{owner_id}");
        ctx.client
            .get(&path)?
            .get("username")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidResponse(format!("{path} has no username")))
    }
}

/// A web application with its server and owner resolved
struct BoundWebApplication<'a> {
    desired: &'a WebApplication,
    server_id: u64,
    owner_id: u64,
    open_basedir: String,
}

impl UpsertResource for BoundWebApplication<'_> {
    fn kind(&self) -> &'static str {
        "webapp"
    }

    fn collection(&self) -> String {
        webapps_path(self.server_id)
    }

    fn key(&self) -> &str {
        &self.desired.name
    }

    fn create_path(&self) -> String {
        format!("servers/{}/webapps/custom", self.server_id)
    }

    fn create_payload(&self) -> Result<Value> {
        let desired = self.desired;
        Ok(json!({
            "name": desired.name,
            "domainName": desired.domain_name,
            "user": self.owner_id,
            "publicPath": desired.public_path,
            "phpVersion": desired.php_version.runtime(),
            "stack": desired.stack.as_str(),
            "stackMode": desired.stack_mode.as_str(),
            "clickjackingProtection": desired.headers.clickjacking_protection,
            "xssProtection": desired.headers.xss_protection,
            "mimeSniffingProtection": desired.headers.mime_sniffing_protection,
            "processManager": desired.fpm.process_manager.as_str(),
            "processManagerStartServers": desired.fpm.start_servers,
            "processManagerMinSpareServers": desired.fpm.min_spare_servers,
            "processManagerMaxSpareServers": desired.fpm.max_spare_servers,
            "processManagerMaxChildren": desired.fpm.max_children,
            "processManagerMaxRequests": desired.fpm.max_requests,
            "openBasedir": self.open_basedir,
            "timezone": desired.php.timezone,
            "disableFunctions": desired.php.disable_functions,
            "maxExecutionTime": desired.php.max_execution_time,
            "maxInputTime": desired.php.max_input_time,
            "maxInputVars": desired.php.max_input_vars,
            "memoryLimit": desired.php.memory_limit,
            "postMaxSize": desired.php.post_max_size,
            "uploadMaxFilesize": desired.php.upload_max_filesize,
            "sessionGcMaxlifetime": desired.php.session_gc_maxlifetime,
            "allowUrlFopen": desired.php.allow_url_fopen,
        }))
    }
}

impl Reconciler for WebApplication {
    fn kind(&self) -> &'static str {
        "webapp"
    }

    fn converge(&self, ctx: &ApplyContext) -> Result<Outcome> {
        executor::converge(ctx, &self.bind(ctx)?)
    }

    fn destroy(&self, ctx: &ApplyContext) -> Result<Outcome> {
        let server_id = resolve_server(ctx, &self.server)?;
        executor::destroy(
            ctx,
            &Existing {
                kind: "webapp",
                collection: webapps_path(server_id),
                key_field: "name",
                key: &self.name,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::{bodies, client};
    use declarative::ApplyResult;
    use runcloud_api::{Method, MockTransport};

    fn desired() -> WebApplication {
        WebApplication::new(
            Lookup::by_name("web-1"),
            Lookup::by_name("alice"),
            "shop",
            "shop.example.com",
            PhpVersion::Php82,
        )
    }

    fn mock(webapps: Vec<Value>) -> MockTransport {
        let mock = MockTransport::new();
        mock.collection("servers", vec![json!({"id": 1, "name": "web-1"})]);
        mock.collection("servers/1/users", vec![json!({"id": 5, "username": "alice"})]);
        mock.collection("servers/1/webapps", webapps);
        mock
    }

    #[test]
    fn test_create_posts_full_settings() {
        let mock = mock(vec![]);
        mock.ok(
            Method::Post,
            "servers/1/webapps/custom",
            json!({"id": 10, "name": "shop"}),
        );
        let client = client(&mock);

        let outcome = desired().converge(&ApplyContext::new(&client)).unwrap();

        assert_eq!(outcome.result, ApplyResult::Created);
        assert_eq!(outcome.data["id"], 10);
        let posted = bodies(&mock, Method::Post, "servers/1/webapps/custom");
        assert_eq!(posted.len(), 1);
        let body = &posted[0];
        assert_eq!(body["user"], 5);
        assert_eq!(body["phpVersion"], "php82rc");
        assert_eq!(body["stack"], "hybrid");
        assert_eq!(body["processManagerMaxChildren"], 5);
        assert_eq!(body["maxInputVars"], 1000);
        assert_eq!(
            body["openBasedir"],
            "/home/alice/webapps/shop:/var/lib/php/session:/tmp"
        );
        assert_eq!(mock.mutations().len(), 1);
    }

    #[test]
    fn test_existing_webapp_is_unchanged() {
        let mock = mock(vec![json!({"id": 10, "name": "shop", "phpVersion": "php74rc"})]);
        let client = client(&mock);

        let outcome = desired().converge(&ApplyContext::new(&client)).unwrap();

        assert_eq!(outcome.result, ApplyResult::NoChange);
        assert_eq!(outcome.data["id"], 10);
        assert!(mock.mutations().is_empty());
    }

    #[test]
    fn test_owner_by_id_reads_username() {
        let mock = mock(vec![json!({"id": 10, "name": "shop"})]);
        mock.ok(Method::Get, "servers/1/users/5", json!({"id": 5, "username": "alice"}));
        let client = client(&mock);

        let mut webapp = desired();
        webapp.owner = Lookup::by_id(5);
        let bound = webapp.bind(&ApplyContext::new(&client)).unwrap();

        assert_eq!(bound.owner_id, 5);
        assert_eq!(
            bound.open_basedir,
            "/home/alice/webapps/shop:/var/lib/php/session:/tmp"
        );
        assert!(mock.calls(Method::Get, "servers/1/users").is_empty());
    }

    #[test]
    fn test_owner_id_wins_over_name_for_open_basedir() {
        let mock = mock(vec![]);
        mock.ok(Method::Get, "servers/1/users/5", json!({"id": 5, "username": "alice"}));
        mock.ok(Method::Post, "servers/1/webapps/custom", json!({"id": 10, "name": "shop"}));
        let client = client(&mock);

        let mut webapp = desired();
        webapp.owner = Lookup::new(Some(5), Some("bob".into()));
        webapp.converge(&ApplyContext::new(&client)).unwrap();

        let body = &bodies(&mock, Method::Post, "servers/1/webapps/custom")[0];
        assert_eq!(body["user"], 5);
        assert_eq!(
            body["openBasedir"],
            "/home/alice/webapps/shop:/var/lib/php/session:/tmp"
        );
    }

    #[test]
    fn test_explicit_open_basedir_skips_user_lookup() {
        let mock = mock(vec![]);
        let client = client(&mock);

        let mut webapp = desired();
        webapp.owner = Lookup::by_id(5);
        webapp.php.open_basedir = Some("/srv/shop".into());
        let bound = webapp.bind(&ApplyContext::new(&client)).unwrap();

        assert_eq!(bound.open_basedir, "/srv/shop");
        assert!(mock.calls(Method::Get, "servers/1/users/5").is_empty());
    }

    #[test]
    fn test_unknown_owner_is_not_found() {
        let mock = mock(vec![]);
        let client = client(&mock);

        let mut webapp = desired();
        webapp.owner = Lookup::by_name("bob");
        let err = webapp.converge(&ApplyContext::new(&client)).unwrap_err();

        assert_eq!(err.to_string(), "Failed to find system user by name or ID.");
        assert!(mock.mutations().is_empty());
    }

    #[test]
    fn test_destroy_deletes_member() {
        let mock = mock(vec![json!({"id": 10, "name": "shop"})]);
        mock.ok(Method::Delete, "servers/1/webapps/10", json!({}));
        let client = client(&mock);

        let outcome = desired().destroy(&ApplyContext::new(&client)).unwrap();

        assert_eq!(outcome.result, ApplyResult::Removed);
        assert_eq!(mock.mutations().len(), 1);
        assert!(mock.calls(Method::Get, "servers/1/users").is_empty());
    }

    #[test]
    fn test_stack_choice_validation() {
        assert_eq!("nativenginx".parse::<Stack>().unwrap(), Stack::NativeNginx);
        assert!("apache".parse::<Stack>().is_err());
        assert!("fast".parse::<ProcessManager>().is_err());
    }
}
