use tracing::{Level, event};

use super::check_children;
use crate::{
    adapter::director::SequentialDirector,
    domain::{constant::flow, error::Result, state::ActorKind},
    port::{
        actor::{Actor, ActorBase, Lifecycle},
        director::Director
    }
};

/// The outermost container of a flow; owns the storage table
#[derive(Clone)]
pub struct Flow {
    base: ActorBase
}

impl Flow {
    const DIRECTOR: SequentialDirector = SequentialDirector::new(true, true, false);

    pub fn new() -> Self {
        Self { base: ActorBase::container(ActorKind::Standalone).with_storage() }
    }
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for Flow {
    fn class_name(&self) -> &'static str {
        "controls.Flow"
    }

    fn description(&self) -> &'static str {
        "Encapsulates a complete flow."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        if self.base.children().is_empty() {
            // reports the empty flow
            return Self::DIRECTOR.check(&[]);
        }
        check_children(&self.base, &Self::DIRECTOR)
    }

    fn do_execute(&mut self) -> Result<()> {
        let stop = self.base.stop_check();
        let mut children = self.base.children_mut();
        Self::DIRECTOR.execute(&mut children, None, &stop)
    }
}

/// Runs an actor tree from start to finish: `setup`, `execute`, then
/// `wrap_up` and `clean_up` regardless of the outcome
pub fn run_flow(root: &mut dyn Actor) -> Result<()> {
    let name = root.full_name();
    event!(Level::INFO, event = flow::FLOW_STARTED, flow = %name);

    let result = root.setup().and_then(|_| root.execute());
    root.wrap_up();
    root.clean_up();

    match &result {
        Ok(()) if root.is_stopped() => event!(Level::INFO, event = flow::INTERRUPTED, flow = %name),
        Ok(()) => event!(Level::INFO, event = flow::FLOW_FINISHED, flow = %name),
        Err(e) => event!(Level::ERROR, event = flow::FLOW_FAILED, flow = %name, error = %e)
    }
    result
}
