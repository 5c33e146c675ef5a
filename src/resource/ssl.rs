//! SSL resource - certificate mode and basic certificate of a web application
//!
//! Two phases: first the advanced/basic mode switch, then (basic mode only)
//! the installed certificate. A certificate whose settings drifted cannot be
//! edited; it is deleted and installed again.

use declarative::{ApplyContext, ApplyResult, Outcome, Reconciler, drifted_fields, values_match};
use runcloud_api::{Error, Lookup, Method, Record, Result, record_id};
use serde_json::{Value, json};

use super::{choice, resolve_server, resolve_webapp};

/// Message the API returns for a web application without a certificate
const NOT_INSTALLED: &str = "SSL not installed!";

choice! {
    SslProvider, "provider" {
        LetsEncrypt => "letsencrypt",
    }
}

choice! {
    /// Minimum TLS version
    SslProtocol, "protocol" {
        Tls11 => "TLSv1.1",
        Tls12 => "TLSv1.2",
        Tls13 => "TLSv1.3",
    }
}

impl SslProtocol {
    /// Numeric `ssl_protocol_id` used by the API
    pub fn code(&self) -> u8 {
        match self {
            Self::Tls11 => 1,
            Self::Tls12 => 2,
            Self::Tls13 => 3,
        }
    }
}

choice! {
    AuthorizationMethod, "authorization_method" {
        Http01 => "http-01",
    }
}

choice! {
    SslEnvironment, "environment" {
        Live => "live",
        Staging => "staging",
    }
}

/// Desired state of a web application's SSL
#[derive(Debug, Clone)]
pub struct Ssl {
    pub server: Lookup,
    pub webapp: Lookup,
    pub advanced: bool,
    pub auto: bool,
    pub provider: SslProvider,
    pub enable_http: bool,
    pub enable_hsts: bool,
    pub protocol: SslProtocol,
    pub authorization_method: AuthorizationMethod,
    pub environment: SslEnvironment,
}

impl Ssl {
    pub fn new(server: Lookup, webapp: Lookup) -> Self {
        Self {
            server,
            webapp,
            advanced: false,
            auto: false,
            provider: SslProvider::LetsEncrypt,
            enable_http: false,
            enable_hsts: false,
            protocol: SslProtocol::Tls11,
            authorization_method: AuthorizationMethod::Http01,
            environment: SslEnvironment::Live,
        }
    }

    fn base_path(&self, ctx: &ApplyContext) -> Result<String> {
        let server_id = resolve_server(ctx, &self.server)?;
        let webapp_id = resolve_webapp(ctx, server_id, &self.webapp)?;
        Ok(format!("servers/{server_id}/webapps/{webapp_id}/ssl"))
    }

    fn install_payload(&self) -> Value {
        json!({
            "provider": self.provider.as_str(),
            "enableHttp": self.enable_http,
            "enableHsts": self.enable_hsts,
            "ssl_protocol_id": self.protocol.code(),
            "authorizationMethod": self.authorization_method.as_str(),
            "environment": self.environment.as_str(),
        })
    }

    /// Fields compared against an installed certificate
    ///
    /// The environment is only compared when the record reports `staging`.
    fn expected(&self, certificate: &Record) -> Vec<(&'static str, Value)> {
        let mut expected = vec![
            ("enableHttp", json!(self.enable_http)),
            ("enableHsts", json!(self.enable_hsts)),
            ("ssl_protocol_id", json!(self.protocol.code())),
        ];
        if certificate.get("staging").is_some_and(|staging| !staging.is_null()) {
            expected.push(("staging", json!(self.environment == SslEnvironment::Staging)));
        }
        expected
    }

    /// Switch between advanced and basic mode; returns the mode record and
    /// whether it changed
    fn converge_mode(&self, ctx: &ApplyContext, base: &str) -> Result<(Record, bool)> {
        let path = format!("{base}/advanced");
        let current = ctx.client.get(&path)?;
        let desired = json!(self.advanced);
        if values_match(current.get("advancedSSL"), &desired) {
            return Ok((current, false));
        }

        log::info!("switching SSL mode (advanced = {})", self.advanced);
        let response = ctx.client.post(
            &path,
            &json!({ "advancedSSL": self.advanced, "autoSSL": self.auto }),
        )?;
        match response.get("advancedSSL") {
            Some(actual) if !actual.is_null() && values_match(Some(actual), &desired) => {
                Ok((response, true))
            }
            _ => Err(Error::Convergence("Failed to change SSL mode.".to_string())),
        }
    }

    /// The installed basic certificate, or `None` when there is none
    fn installed(ctx: &ApplyContext, base: &str) -> Result<Option<Record>> {
        let response = ctx.client.send(Method::Get, base, None)?;
        if response.message() == Some(NOT_INSTALLED) {
            return Ok(None);
        }
        response.into_success(Method::Get, base).map(Some)
    }

    fn install(&self, ctx: &ApplyContext, base: &str) -> Result<Record> {
        log::info!("installing {} certificate", self.provider);
        ctx.client.post(base, &self.install_payload())
    }

    fn delete_certificate(ctx: &ApplyContext, base: &str, certificate: &Record) -> Result<()> {
        let id = record_id(certificate)
            .ok_or_else(|| Error::InvalidResponse("SSL certificate has no id".to_string()))?;
        ctx.client.delete(&format!("{base}/{id}"), None)?;
        Ok(())
    }
}

impl Reconciler for Ssl {
    fn kind(&self) -> &'static str {
        "ssl"
    }

    fn converge(&self, ctx: &ApplyContext) -> Result<Outcome> {
        let base = self.base_path(ctx)?;

        let (mode, switched) = self.converge_mode(ctx, &base)?;
        let mut result = if switched {
            ApplyResult::Modified
        } else {
            ApplyResult::NoChange
        };
        if self.advanced {
            return Ok(Outcome::new(result, mode));
        }

        let certificate = match Self::installed(ctx, &base)? {
            None => {
                if result == ApplyResult::NoChange {
                    result = ApplyResult::Created;
                }
                self.install(ctx, &base)?
            }
            Some(current) => {
                let expected = self.expected(&current);
                let drift = drifted_fields(&current, &expected);
                if drift.is_empty() {
                    current
                } else {
                    log::info!("reinstalling certificate ({})", drift.join(", "));
                    Self::delete_certificate(ctx, &base, &current)?;
                    result = result.with_mutation();
                    self.install(ctx, &base)?
                }
            }
        };

        Ok(Outcome::new(result, certificate))
    }

    fn destroy(&self, ctx: &ApplyContext) -> Result<Outcome> {
        if self.advanced {
            return Err(Error::Unsupported {
                operation: "delete",
                kind: "advanced ssl",
            });
        }

        let base = self.base_path(ctx)?;
        let Some(certificate) = Self::installed(ctx, &base)? else {
            return Ok(Outcome::empty());
        };
        log::info!("deleting certificate");
        Self::delete_certificate(ctx, &base, &certificate)?;
        Ok(Outcome::new(ApplyResult::Removed, certificate))
    }
}
