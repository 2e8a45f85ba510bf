//! Federation: planning a query across services and stitching the results.
//!
//! The planner consumes a validated selection set against a merged,
//! service-annotated schema ([`FederatedSchema`]) and produces a tree of
//! per-service [`Plan`] nodes. The gateway walks that tree, dispatches each
//! node's subquery over a [`ServiceTransport`], and stitches the responses
//! into one value, routing by path steps and runtime type names.

mod flatten;
mod gateway;
mod plan;
mod planner;
pub mod wire;

mod schema;

pub use self::{
    gateway::{ServiceTransport, execute_plan},
    plan::{PathStep, Plan},
    planner::{FEDERATION_FIELD, PlanError, plan},
    schema::{FederatedSchema, FederatedSchemaBuilder},
};
