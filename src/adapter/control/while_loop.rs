use super::{check_children, check_first_child, condition_spec, evaluate_condition, run_children};
use crate::{
    adapter::director::SequentialDirector,
    domain::{error::Result, state::ActorKind},
    port::actor::{Actor, ActorBase, Lifecycle}
};

/// Runs its sub-flow for as long as the condition holds
///
/// The condition sees the token that started the loop. Every iteration is a
/// fresh director pass; a stop request ends the loop once the running pass
/// returns.
#[derive(Clone)]
pub struct WhileLoop {
    base: ActorBase
}

impl WhileLoop {
    const DIRECTOR: SequentialDirector = SequentialDirector::new(true, true, false);

    pub fn new() -> Self {
        let mut base = ActorBase::container(ActorKind::Sink);
        base.declare(condition_spec());
        Self { base }
    }
}

impl Default for WhileLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for WhileLoop {
    fn class_name(&self) -> &'static str {
        "controls.WhileLoop"
    }

    fn description(&self) -> &'static str {
        "Executes the sub-flow as long as the boolean condition evaluates to 'True'."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        check_first_child(&self.base, false)?;
        check_children(&self.base, &Self::DIRECTOR)
    }

    fn do_execute(&mut self) -> Result<()> {
        let token = self.base.take_input();
        if self.base.children().is_empty() {
            return Ok(());
        }
        while !self.is_stopped() && evaluate_condition(&mut self.base, token.as_ref())? {
            run_children(&mut self.base, &Self::DIRECTOR, None)?;
        }
        Ok(())
    }
}
