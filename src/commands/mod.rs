//! Subcommand implementations
//!
//! Every command builds its desired-state value from the arguments first,
//! so invalid input is rejected before credentials are read or any request
//! is sent. [`reconcile`] then connects and applies it.

use anyhow::Result;
use declarative::{ApplyContext, CommandRunner, NoRunner, Outcome, Reconciler};
use runcloud_api::Client;

use crate::Context;
use crate::cli::State;
use crate::config::{self, Profile};
use crate::ui;

pub mod account;
pub mod database;
pub mod domain;
pub mod server;
pub mod ssl;
pub mod webapp;

/// Connect, apply the desired state, and print the outcome
pub fn reconcile<R: Reconciler>(ctx: &Context, resource: &R, state: State) -> Result<()> {
    reconcile_with(ctx, resource, state, &NoRunner)
}

/// Like [`reconcile`], with a runner for local scripts
pub fn reconcile_with<R: Reconciler>(
    ctx: &Context,
    resource: &R,
    state: State,
    runner: &dyn CommandRunner,
) -> Result<()> {
    let client = connect(ctx)?;
    let apply_ctx = ApplyContext::with_runner(&client, runner);

    log::debug!("applying {} (state: {})", resource.kind(), state_name(state));
    let outcome = resource.apply(&apply_ctx, state.into())?;
    print_outcome(ctx, resource.kind(), &outcome)
}

fn connect(ctx: &Context) -> Result<Client> {
    let profile = Profile::load(ctx.config.as_deref())
        .map_err(|e| runcloud_api::Error::Config(format!("{e:#}")))?;
    let api = config::resolve(ctx.overrides.clone().with_env(), profile)?;
    log::debug!("using {api:?}");
    Ok(Client::from_config(&api)?)
}

fn state_name(state: State) -> &'static str {
    match state {
        State::Present => "present",
        State::Absent => "absent",
    }
}

fn print_outcome(ctx: &Context, kind: &str, outcome: &Outcome) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&outcome.report(kind))?);
    } else if !ctx.quiet || outcome.changed() {
        ui::outcome(kind, outcome);
    }
    Ok(())
}
