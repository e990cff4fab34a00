//! # actorflow
//!
//! A flow-based actor execution engine. Actors (sources, transformers, sinks
//! and standalones) are composed into trees of control actors and executed by
//! directors that pass tokens from one actor to the next.
//!
//! This crate provides:
//! - The actor lifecycle and typed options with late-bound `@{variable}` references
//! - Sequential and branch directors with buffering of multi-valued outputs
//! - Control actors for branching, triggering, tee-ing and looping
//! - Boolean conditions, including an expression evaluator
//! - JSON/YAML persistence through a class registry
//!
//! ```no_run
//! use actorflow::{ClassRegistry, load_actor, run_flow};
//!
//! let registry = ClassRegistry::with_defaults();
//! let mut flow = load_actor("flows/while_loop.yaml".as_ref(), &registry)?;
//! run_flow(flow.as_mut())?;
//! # Ok::<(), actorflow::FlowError>(())
//! ```

pub mod adapter;
pub mod cli;
pub mod config;
pub mod domain;
pub mod port;

pub use adapter::{
    control::{Flow, run_flow},
    persist::{load_actor, save_actor},
    registry::ClassRegistry
};
pub use domain::{
    error::{FlowError, Result},
    value::{Token, Value}
};
pub use port::{
    actor::{Actor, Lifecycle},
    condition::{BooleanCondition, Evaluate}
};
