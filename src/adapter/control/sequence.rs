use super::{check_children, run_children};
use crate::{
    adapter::director::{BranchDirector, SequentialDirector},
    domain::{error::Result, state::ActorKind},
    port::actor::{Actor, ActorBase}
};

/// Self-contained pipeline of sub-actors, runnable wherever a standalone is
#[derive(Clone)]
pub struct Sequence {
    base: ActorBase
}

impl Sequence {
    const DIRECTOR: SequentialDirector = SequentialDirector::new(false, true, false);

    pub fn new() -> Self {
        Self { base: ActorBase::container(ActorKind::Standalone) }
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for Sequence {
    fn class_name(&self) -> &'static str {
        "controls.Sequence"
    }

    fn description(&self) -> &'static str {
        "Executes the sub-actors one after the other, with the output of an actor being the input for the next."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        check_children(&self.base, &Self::DIRECTOR)
    }

    fn do_execute(&mut self) -> Result<()> {
        run_children(&mut self.base, &Self::DIRECTOR, None)
    }
}

/// Forwards every incoming token to each of its sub-actors
#[derive(Clone)]
pub struct Branch {
    base: ActorBase
}

impl Branch {
    pub fn new() -> Self {
        Self { base: ActorBase::container(ActorKind::Sink) }
    }
}

impl Default for Branch {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for Branch {
    fn class_name(&self) -> &'static str {
        "controls.Branch"
    }

    fn description(&self) -> &'static str {
        "Forwards the input data to all of its sub-actors."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        check_children(&self.base, &BranchDirector)
    }

    fn do_execute(&mut self) -> Result<()> {
        let input = self.base.take_input();
        run_children(&mut self.base, &BranchDirector, input)
    }
}
