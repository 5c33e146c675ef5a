use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use declarative::DesiredState;
use runcloud_api::Lookup;

#[derive(Parser)]
#[command(name = "rcctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Converge RunCloud servers, web apps, domains, SSL, databases and users", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print the result as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Profile file (default: ~/.config/rcctl/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// API base URL
    #[arg(long, global = true, env = "RC_BASE_URL")]
    pub base_url: Option<String>,

    /// API key (also RC_API_KEY or RUNCLOUD_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API secret (also RC_API_SECRET or RUNCLOUD_API_SECRET)
    #[arg(long, global = true)]
    pub api_secret: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a server and converge its settings
    Server(ServerArgs),

    /// Create or remove a web application
    Webapp(WebappArgs),

    /// Manage a domain of a web application
    Domain(DomainArgs),

    /// Manage the SSL mode and certificate of a web application
    Ssl(SslArgs),

    /// Manage a database and its user grants
    Database(DatabaseArgs),

    /// Manage a database user
    DatabaseUser(AccountArgs),

    /// Manage a system user
    SystemUser(AccountArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared arguments
// ============================================================================

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum State {
    #[default]
    Present,
    Absent,
}

impl From<State> for DesiredState {
    fn from(state: State) -> Self {
        match state {
            State::Present => Self::Present,
            State::Absent => Self::Absent,
        }
    }
}

#[derive(Args)]
pub struct StateArg {
    /// Whether the resource should exist
    #[arg(long, value_enum, default_value_t = State::Present)]
    pub state: State,
}

#[derive(Args)]
pub struct ServerRef {
    /// Server ID (trusted without lookup)
    #[arg(long)]
    pub server_id: Option<u64>,

    /// Server name
    #[arg(long, required_unless_present = "server_id")]
    pub server_name: Option<String>,
}

impl ServerRef {
    pub fn lookup(&self) -> Lookup {
        Lookup::new(self.server_id, self.server_name.clone())
    }
}

#[derive(Args)]
pub struct WebappRef {
    /// Web application ID (trusted without lookup)
    #[arg(long)]
    pub webapp_id: Option<u64>,

    /// Web application name
    #[arg(long, required_unless_present = "webapp_id")]
    pub webapp_name: Option<String>,
}

impl WebappRef {
    pub fn lookup(&self) -> Lookup {
        Lookup::new(self.webapp_id, self.webapp_name.clone())
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Args)]
pub struct ServerArgs {
    #[command(flatten)]
    pub state: StateArg,

    /// Server name
    #[arg(long)]
    pub name: String,

    /// Public IP address (identifies the server)
    #[arg(long)]
    pub ip_address: String,

    /// Hosting provider label
    #[arg(long, default_value = "digitalocean")]
    pub provider: String,

    /// CLI PHP version: 7.4, 8.0, 8.1, 8.2 or 8.3
    #[arg(long)]
    pub php_version: String,

    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub passwordless_login: bool,

    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub use_dns: bool,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub prevent_root_login: bool,

    /// Unattended software updates
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub software_update: bool,

    /// Unattended security updates
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub security_update: bool,

    /// Run the agent installation script here if the server is not connected
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub install_script: bool,

    /// Run the installation script through sudo
    #[arg(long)]
    pub sudo: bool,
}

// ============================================================================
// Web application
// ============================================================================

#[derive(Args)]
pub struct WebappArgs {
    #[command(flatten)]
    pub state: StateArg,

    #[command(flatten)]
    pub server: ServerRef,

    /// Web application name
    #[arg(long)]
    pub name: String,

    /// Primary domain name
    #[arg(long)]
    pub domain_name: String,

    /// Owning system user ID (trusted without lookup)
    #[arg(long)]
    pub user_id: Option<u64>,

    /// Owning system user name
    #[arg(long, required_unless_present = "user_id")]
    pub user_name: Option<String>,

    /// Public directory relative to the app root
    #[arg(long)]
    pub public_path: Option<String>,

    /// PHP version: 7.4, 8.0, 8.1, 8.2 or 8.3
    #[arg(long)]
    pub php_version: String,

    /// hybrid, nativenginx or customnginx
    #[arg(long, default_value = "hybrid")]
    pub stack: String,

    /// production or development
    #[arg(long, default_value = "production")]
    pub stack_mode: String,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub clickjacking_protection: bool,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub xss_protection: bool,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub mime_sniffing_protection: bool,

    /// dynamic, ondemand or static
    #[arg(long, default_value = "dynamic")]
    pub process_manager: String,

    #[arg(long, default_value_t = 1)]
    pub process_manager_start_servers: u32,

    #[arg(long, default_value_t = 1)]
    pub process_manager_min_spare_servers: u32,

    #[arg(long, default_value_t = 1)]
    pub process_manager_max_spare_servers: u32,

    #[arg(long, default_value_t = 5)]
    pub process_manager_max_children: u32,

    #[arg(long, default_value_t = 500)]
    pub process_manager_max_requests: u32,

    /// Defaults to /home/<user>/webapps/<name>:/var/lib/php/session:/tmp
    #[arg(long)]
    pub open_basedir: Option<String>,

    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    /// Comma-separated PHP functions to disable (default: a hardened list)
    #[arg(long)]
    pub disable_functions: Option<String>,

    #[arg(long, default_value_t = 30)]
    pub max_execution_time: u32,

    #[arg(long, default_value_t = 60)]
    pub max_input_time: u32,

    #[arg(long, default_value_t = 1000)]
    pub max_input_vars: u32,

    /// In MB
    #[arg(long, default_value_t = 256)]
    pub memory_limit: u32,

    /// In MB
    #[arg(long, default_value_t = 256)]
    pub post_max_size: u32,

    /// In MB
    #[arg(long, default_value_t = 256)]
    pub upload_max_filesize: u32,

    #[arg(long, default_value_t = 256)]
    pub session_gc_maxlifetime: u32,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub allow_url_fopen: bool,
}

// ============================================================================
// Domain
// ============================================================================

#[derive(Args)]
pub struct DomainArgs {
    #[command(flatten)]
    pub state: StateArg,

    #[command(flatten)]
    pub server: ServerRef,

    #[command(flatten)]
    pub webapp: WebappRef,

    /// Domain name
    #[arg(long)]
    pub name: String,

    /// Also serve the www. variant
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub www: bool,

    /// none, www or non-www
    #[arg(long, default_value = "none")]
    pub redirection: String,

    /// alias, primary or redirect
    #[arg(long = "type", default_value = "alias")]
    pub domain_type: String,
}

// ============================================================================
// SSL
// ============================================================================

#[derive(Args)]
pub struct SslArgs {
    #[command(flatten)]
    pub state: StateArg,

    #[command(flatten)]
    pub server: ServerRef,

    #[command(flatten)]
    pub webapp: WebappRef,

    /// Use advanced SSL mode
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub advanced: bool,

    /// Let advanced mode issue certificates automatically
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub auto: bool,

    #[arg(long, default_value = "letsencrypt")]
    pub provider: String,

    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub enable_http: bool,

    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub enable_hsts: bool,

    /// TLSv1.1, TLSv1.2 or TLSv1.3
    #[arg(long, default_value = "TLSv1.1")]
    pub protocol: String,

    #[arg(long, default_value = "http-01")]
    pub authorization_method: String,

    /// live or staging
    #[arg(long, default_value = "live")]
    pub environment: String,
}

// ============================================================================
// Database
// ============================================================================

#[derive(Args)]
pub struct DatabaseArgs {
    #[command(flatten)]
    pub state: StateArg,

    #[command(flatten)]
    pub server: ServerRef,

    /// Database name
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "utf8_danish_ci")]
    pub collation: String,

    /// Database users to grant access (repeatable or comma-separated)
    #[arg(long = "user", value_delimiter = ',')]
    pub users: Vec<String>,

    /// Revoke every grant; without --user or this flag grants are left alone
    #[arg(long, conflicts_with = "users")]
    pub revoke_all: bool,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Args)]
pub struct AccountArgs {
    #[command(flatten)]
    pub state: StateArg,

    #[command(flatten)]
    pub server: ServerRef,

    #[arg(long)]
    pub username: String,

    /// Required to create the user
    #[arg(long, env = "RC_USER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}
