//! RunCloud resources
//!
//! Each resource is an immutable desired-state value. Enumerated settings are
//! parsed into typed values when the value is built, so bad input fails
//! before any request is made. Converging first resolves parent ids (server,
//! web application, owner) and then hands a bound view to the generic
//! upsert engine.

use declarative::{ApplyContext, UpsertResource};
use runcloud_api::resolver::Collection;
use runcloud_api::{Error, Lookup, Result};
use serde_json::Value;

pub mod account;
pub mod database;
pub mod domain;
pub mod server;
pub mod ssl;
pub mod web_application;

pub use account::{DatabaseUser, SystemUser};
pub use database::Database;
pub use domain::Domain;
pub use server::Server;
pub use ssl::Ssl;
pub use web_application::WebApplication;

/// Enumerated setting accepted as a fixed set of strings
macro_rules! choice {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const VALUES: &[&str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::runcloud_api::Error;

            fn from_str(s: &str) -> ::runcloud_api::Result<Self> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(::runcloud_api::Error::validation($field, other, Self::VALUES)),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use choice;

choice! {
    /// PHP release line
    PhpVersion, "php_version" {
        Php74 => "7.4",
        Php80 => "8.0",
        Php81 => "8.1",
        Php82 => "8.2",
        Php83 => "8.3",
    }
}

impl PhpVersion {
    /// Runtime identifier used by the API
    pub fn runtime(&self) -> &'static str {
        match self {
            Self::Php74 => "php74rc",
            Self::Php80 => "php80rc",
            Self::Php81 => "php81rc",
            Self::Php82 => "php82rc",
            Self::Php83 => "php83rc",
        }
    }
}

pub(crate) fn servers() -> Collection<'static> {
    Collection::named("server", "servers")
}

/// Resolve the server a resource lives on
pub(crate) fn resolve_server(ctx: &ApplyContext, server: &Lookup) -> Result<u64> {
    ctx.client.resolve(servers(), server)
}

pub(crate) fn webapps_path(server_id: u64) -> String {
    format!("servers/{server_id}/webapps")
}

/// Resolve a web application on an already resolved server
pub(crate) fn resolve_webapp(ctx: &ApplyContext, server_id: u64, webapp: &Lookup) -> Result<u64> {
    let path = webapps_path(server_id);
    ctx.client
        .resolve(Collection::named("web application", &path), webapp)
}

/// An existing member of a collection, located by natural key
///
/// Used to remove resources whose create payload needs more than is known
/// at delete time.
pub(crate) struct Existing<'a> {
    pub kind: &'static str,
    pub collection: String,
    pub key_field: &'static str,
    pub key: &'a str,
}

impl UpsertResource for Existing<'_> {
    fn kind(&self) -> &'static str {
        self.kind
    }

    fn collection(&self) -> String {
        self.collection.clone()
    }

    fn key_field(&self) -> &'static str {
        self.key_field
    }

    fn key(&self) -> &str {
        self.key
    }

    fn create_payload(&self) -> Result<Value> {
        Err(Error::Unsupported {
            operation: "create",
            kind: self.kind,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use runcloud_api::{Client, Method, MockTransport};
    use serde_json::{Value, json};

    pub fn client(mock: &MockTransport) -> Client {
        Client::with_transport(Box::new(mock.clone()))
    }

    /// Mock with one server `web-1` (id 1) and its web application `shop` (id 10)
    pub fn mock_with_webapp() -> MockTransport {
        let mock = MockTransport::new();
        mock.collection("servers", vec![json!({"id": 1, "name": "web-1"})]);
        mock.collection("servers/1/webapps", vec![json!({"id": 10, "name": "shop"})]);
        mock
    }

    pub fn bodies(mock: &MockTransport, method: Method, path: &str) -> Vec<Value> {
        mock.calls(method, path)
            .into_iter()
            .filter_map(|r| r.body)
            .collect()
    }
}
