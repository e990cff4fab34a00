//! Control actors: containers that drive sub-actors through a director, plus
//! the actors that steer a running flow

mod flow;
mod sequence;
mod steer;
mod trigger;
mod while_loop;

pub use flow::{Flow, run_flow};
pub use sequence::{Branch, Sequence};
pub use steer::{Sleep, Stop};
pub use trigger::{ConditionalTee, ConditionalTrigger, Tee, Trigger};
pub use while_loop::WhileLoop;

use crate::{
    adapter::condition::AlwaysTrue,
    domain::{
        error::{FlowError, Result},
        option::OptionSpec,
        state::ActorKind,
        value::{Token, ValueType}
    },
    port::{
        actor::{ActorBase, Lifecycle},
        condition::{BooleanCondition, Evaluate},
        director::Director
    }
};

pub const CONDITION_OPTION: &str = "condition";

/// The `condition` option of the conditional controls, defaulting to always true
fn condition_spec() -> OptionSpec {
    let default: Box<dyn BooleanCondition> = Box::new(AlwaysTrue::new());
    OptionSpec::new(CONDITION_OPTION, ValueType::Condition, default, "The boolean condition to use")
}

/// Structural check of the sub-actors; an empty list passes
fn check_children(base: &ActorBase, director: &dyn Director) -> Result<()> {
    let kinds: Vec<ActorKind> = base.children().iter().map(|child| child.kind()).collect();
    if kinds.is_empty() {
        return Ok(());
    }
    director.check(&kinds)
}

/// Requires the first sub-actor to accept input (`true`) or to not accept it (`false`)
fn check_first_child(base: &ActorBase, accepts_input: bool) -> Result<()> {
    let children = base.children();
    let Some(first) = children.first() else {
        return Ok(());
    };
    match (accepts_input, first.kind().accepts_input()) {
        (true, false) => Err(FlowError::Structural(format!("First sub-actor must accept input: {}", first.full_name()))),
        (false, true) => Err(FlowError::Structural(format!(
            "First sub-actor is not allowed to accept input: {}",
            first.full_name()
        ))),
        _ => Ok(())
    }
}

/// One director pass over the sub-actors, polling this actor's stop flags
fn run_children(base: &mut ActorBase, director: &dyn Director, input: Option<Token>) -> Result<()> {
    let stop = base.stop_check();
    let mut children = base.children_mut();
    if children.is_empty() {
        return Ok(());
    }
    director.execute(&mut children, input, &stop)
}

/// Evaluates the `condition` option; failures are hard errors
fn evaluate_condition(base: &mut ActorBase, token: Option<&Token>) -> Result<bool> {
    match base.options_mut().condition_mut(CONDITION_OPTION) {
        Some(condition) => condition.evaluate(token),
        None => Err(FlowError::Evaluation(format!("No condition set on option '{}'", CONDITION_OPTION)))
    }
}
