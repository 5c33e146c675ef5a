//! # Declarative
//!
//! Declarative resource management on top of the RunCloud API.
//!
//! Describe the desired state of a resource, diff it against what the API
//! reports, and issue only the calls needed to converge.
//!
//! ## Core Concepts
//!
//! - **Reconciler**: something that can be converged or destroyed
//! - **UpsertResource**: a resource found by natural key in a collection,
//!   created when absent, then updated group by group
//! - **FieldGroup**: settings compared together and updated with one call
//! - **Outcome**: the [`ApplyResult`] plus the freshest known record
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ApplyContext, DesiredState, Reconciler};
//!
//! let client = runcloud_api::Client::from_config(&config)?;
//! let ctx = ApplyContext::new(&client);
//!
//! let outcome = server.apply(&ctx, DesiredState::Present)?;
//! println!("{}", outcome.report(server.kind()));
//! ```

pub mod context;
pub mod diff;
pub mod executor;
pub mod resource;
pub mod types;

pub use context::{ApplyContext, CommandRunner, MockRunner, NoRunner};
pub use diff::{SetDiff, drifted_fields, values_match};
pub use executor::{converge, destroy, find_existing};
pub use resource::{FieldGroup, GroupSource, Reconciler, Refresh, UpsertResource};
pub use types::{ApplyResult, CommandOutput, DesiredState, Outcome};
