//! Domain resource - names attached to a web application

use declarative::{
    ApplyContext, FieldGroup, Outcome, Reconciler, UpsertResource, executor,
};
use runcloud_api::{Lookup, Method, Result};
use serde_json::{Value, json};

use super::{choice, resolve_server, resolve_webapp};

choice! {
    Redirection, "redirection" {
        Off => "none",
        Www => "www",
        NonWww => "non-www",
    }
}

choice! {
    DomainType, "type" {
        Alias => "alias",
        Primary => "primary",
        Redirect => "redirect",
    }
}

/// Desired state of a domain
#[derive(Debug, Clone)]
pub struct Domain {
    pub server: Lookup,
    pub webapp: Lookup,
    pub name: String,
    pub www: bool,
    pub redirection: Redirection,
    pub domain_type: DomainType,
}

impl Domain {
    pub fn new(server: Lookup, webapp: Lookup, name: impl Into<String>) -> Self {
        Self {
            server,
            webapp,
            name: name.into(),
            www: false,
            redirection: Redirection::Off,
            domain_type: DomainType::Alias,
        }
    }

    fn bind(&self, ctx: &ApplyContext) -> Result<BoundDomain<'_>> {
        let server_id = resolve_server(ctx, &self.server)?;
        let webapp_id = resolve_webapp(ctx, server_id, &self.webapp)?;
        Ok(BoundDomain {
            desired: self,
            collection: format!("servers/{server_id}/webapps/{webapp_id}/domains"),
        })
    }
}

struct BoundDomain<'a> {
    desired: &'a Domain,
    collection: String,
}

impl BoundDomain<'_> {
    fn payload(&self) -> Value {
        json!({
            "name": self.desired.name,
            "www": self.desired.www,
            "redirection": self.desired.redirection.as_str(),
            "type": self.desired.domain_type.as_str(),
        })
    }
}

impl UpsertResource for BoundDomain<'_> {
    fn kind(&self) -> &'static str {
        "domain"
    }

    fn collection(&self) -> String {
        self.collection.clone()
    }

    fn key(&self) -> &str {
        &self.desired.name
    }

    fn create_payload(&self) -> Result<Value> {
        Ok(self.payload())
    }

    fn diff_after_create(&self) -> bool {
        false
    }

    // The API has no update endpoint for domains; posting again overwrites
    fn field_groups(&self, _id: u64) -> Vec<FieldGroup> {
        vec![
            FieldGroup::patch("settings", self.collection.clone())
                .method(Method::Post)
                .field("www", self.desired.www)
                .field("redirection", self.desired.redirection.as_str())
                .field("type", self.desired.domain_type.as_str())
                .payload(self.payload())
                .replaces_record(),
        ]
    }
}

impl Reconciler for Domain {
    fn kind(&self) -> &'static str {
        "domain"
    }

    fn converge(&self, ctx: &ApplyContext) -> Result<Outcome> {
        executor::converge(ctx, &self.bind(ctx)?)
    }

    fn destroy(&self, ctx: &ApplyContext) -> Result<Outcome> {
        executor::destroy(ctx, &self.bind(ctx)?)
    }
}
