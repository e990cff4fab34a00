//! Transformers that run a sub-flow for every token passing through

use super::{check_children, check_first_child, condition_spec, evaluate_condition, run_children};
use crate::{
    adapter::director::SequentialDirector,
    domain::{error::Result, state::ActorKind},
    port::{
        actor::{Actor, ActorBase},
        director::Director
    }
};

/// Runs the sub-flow for the pending input, unless the condition says no, and
/// forwards the input afterwards. With `feed` the token enters the sub-flow.
fn relay(base: &mut ActorBase, director: &dyn Director, feed: bool, conditional: bool) -> Result<()> {
    let Some(token) = base.take_input() else {
        return Ok(());
    };
    if !conditional || evaluate_condition(base, Some(&token))? {
        let input = if feed { Some(token.clone()) } else { None };
        run_children(base, director, input)?;
    }
    base.push_output(token);
    Ok(())
}

fn conditional_base() -> ActorBase {
    let mut base = ActorBase::container(ActorKind::Transformer);
    base.declare(condition_spec());
    base
}

/// Executes the sub-flow whenever a token arrives, then forwards the token
#[derive(Clone)]
pub struct Trigger {
    base: ActorBase
}

impl Trigger {
    const DIRECTOR: SequentialDirector = SequentialDirector::new(true, true, false);

    pub fn new() -> Self {
        Self { base: ActorBase::container(ActorKind::Transformer) }
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for Trigger {
    fn class_name(&self) -> &'static str {
        "controls.Trigger"
    }

    fn description(&self) -> &'static str {
        "Executes the sub-flow whenever data arrives before forwarding it."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        check_first_child(&self.base, false)?;
        check_children(&self.base, &Self::DIRECTOR)
    }

    fn do_execute(&mut self) -> Result<()> {
        relay(&mut self.base, &Self::DIRECTOR, false, false)
    }
}

/// Like [`Trigger`], but only runs the sub-flow when the condition holds for the token
#[derive(Clone)]
pub struct ConditionalTrigger {
    base: ActorBase
}

impl ConditionalTrigger {
    const DIRECTOR: SequentialDirector = SequentialDirector::new(false, false, false);

    pub fn new() -> Self {
        Self { base: conditional_base() }
    }
}

impl Default for ConditionalTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for ConditionalTrigger {
    fn class_name(&self) -> &'static str {
        "controls.ConditionalTrigger"
    }

    fn description(&self) -> &'static str {
        "Executes the sub-flow whenever a token arrives before forwarding it only if the boolean condition evaluates to 'True'."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        check_first_child(&self.base, false)?;
        check_children(&self.base, &Self::DIRECTOR)
    }

    fn do_execute(&mut self) -> Result<()> {
        relay(&mut self.base, &Self::DIRECTOR, false, true)
    }
}

/// Feeds every token into the sub-flow, then forwards it
#[derive(Clone)]
pub struct Tee {
    base: ActorBase
}

impl Tee {
    const DIRECTOR: SequentialDirector = SequentialDirector::new(false, false, false);

    pub fn new() -> Self {
        Self { base: ActorBase::container(ActorKind::Transformer) }
    }
}

impl Default for Tee {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for Tee {
    fn class_name(&self) -> &'static str {
        "controls.Tee"
    }

    fn description(&self) -> &'static str {
        "Forwards the data passing through also to the sub-flow."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        check_first_child(&self.base, true)?;
        check_children(&self.base, &Self::DIRECTOR)
    }

    fn do_execute(&mut self) -> Result<()> {
        relay(&mut self.base, &Self::DIRECTOR, true, false)
    }
}

/// Like [`Tee`], but only feeds tokens for which the condition holds
#[derive(Clone)]
pub struct ConditionalTee {
    base: ActorBase
}

impl ConditionalTee {
    const DIRECTOR: SequentialDirector = SequentialDirector::new(false, false, false);

    pub fn new() -> Self {
        Self { base: conditional_base() }
    }
}

impl Default for ConditionalTee {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for ConditionalTee {
    fn class_name(&self) -> &'static str {
        "controls.ConditionalTee"
    }

    fn description(&self) -> &'static str {
        "Forwards the data passing through also to the sub-flow if the boolean condition evaluates to 'True'."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        check_first_child(&self.base, true)?;
        check_children(&self.base, &Self::DIRECTOR)
    }

    fn do_execute(&mut self) -> Result<()> {
        relay(&mut self.base, &Self::DIRECTOR, true, true)
    }
}
