//! Actors that steer a running flow from inside

use std::{
    thread,
    time::{Duration, Instant}
};

use tracing::{Level, event};

use crate::{
    domain::{
        constant::actor,
        error::{FlowError, Result},
        option::OptionSpec,
        state::ActorKind,
        value::ValueType
    },
    port::actor::{Actor, ActorBase, Lifecycle}
};

/// Stops the whole flow, optionally logging a message first
#[derive(Clone)]
pub struct Stop {
    base: ActorBase
}

impl Stop {
    pub fn new() -> Self {
        let mut base = ActorBase::new(ActorKind::Transformer);
        base.declare(OptionSpec::new(
            "message",
            ValueType::Str,
            "",
            "The optional message to output; variables get expanded"
        ));
        Self { base }
    }
}

impl Default for Stop {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for Stop {
    fn class_name(&self) -> &'static str {
        "controls.Stop"
    }

    fn description(&self) -> &'static str {
        "Stops the flow."
    }

    actor_base!();

    fn do_execute(&mut self) -> Result<()> {
        self.base.take_input();
        let message = self.base.variables().expand(&self.base.options().get_str("message")?);
        if !message.is_empty() {
            self.base.log(&message);
        }
        event!(Level::DEBUG, event = actor::STOP_REQUESTED, actor = %self.full_name(), scope = "root");
        self.base.root_stop().set();
        Ok(())
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Waits before forwarding the token; a stop request cuts the wait short and
/// drops the token
#[derive(Clone)]
pub struct Sleep {
    base: ActorBase
}

impl Sleep {
    pub fn new() -> Self {
        let mut base = ActorBase::new(ActorKind::Transformer);
        base.declare(OptionSpec::new("seconds", ValueType::Float, 1.0, "The number of seconds to wait"));
        Self { base }
    }
}

impl Default for Sleep {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for Sleep {
    fn class_name(&self) -> &'static str {
        "controls.Sleep"
    }

    fn description(&self) -> &'static str {
        "Pauses execution for the specified number of seconds."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        let seconds = self.base.options().get_float("seconds")?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(FlowError::Configuration(format!("Invalid number of seconds: {}", seconds)));
        }
        Ok(())
    }

    fn do_execute(&mut self) -> Result<()> {
        let seconds = self.base.options().get_float("seconds")?;
        let deadline = Duration::try_from_secs_f64(seconds)
            .ok()
            .and_then(|wait| Instant::now().checked_add(wait))
            .ok_or_else(|| FlowError::Configuration(format!("Invalid number of seconds: {}", seconds)))?;
        let stop = self.base.stop_check();

        loop {
            if stop.is_set() {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }

        if let Some(token) = self.base.take_input() {
            self.base.push_output(token);
        }
        Ok(())
    }
}
