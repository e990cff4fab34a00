//! Sources: actors that only produce tokens

use regex::Regex;
use serde_json::json;

use crate::{
    adapter::{STORAGE_NAME_OPTION, VAR_NAME_OPTION, check_storage_name, check_variable_name, require_storage},
    domain::{
        error::{FlowError, Result},
        option::OptionSpec,
        state::ActorKind,
        value::ValueType
    },
    port::actor::{Actor, ActorBase}
};

/// Emits a single `"start"` token to get a flow going
#[derive(Clone)]
pub struct Start {
    base: ActorBase
}

impl Start {
    pub fn new() -> Self {
        Self { base: ActorBase::new(ActorKind::Source) }
    }
}

impl Default for Start {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for Start {
    fn class_name(&self) -> &'static str {
        "sources.Start"
    }

    fn description(&self) -> &'static str {
        "Outputs dummy data to execute the next actor."
    }

    actor_base!();

    fn do_execute(&mut self) -> Result<()> {
        self.base.push_output(json!("start"));
        Ok(())
    }
}

/// Emits the integers from `start` to `end` (inclusive) in steps of `step`
#[derive(Clone)]
pub struct ForLoop {
    base: ActorBase
}

impl ForLoop {
    pub fn new() -> Self {
        let mut base = ActorBase::new(ActorKind::Source);
        base.declare(OptionSpec::new("start", ValueType::Int, 1, "The first value"));
        base.declare(OptionSpec::new("end", ValueType::Int, 10, "The last value (inclusive)"));
        base.declare(OptionSpec::new("step", ValueType::Int, 1, "The increment, may be negative"));
        Self { base }
    }
}

impl Default for ForLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for ForLoop {
    fn class_name(&self) -> &'static str {
        "sources.ForLoop"
    }

    fn description(&self) -> &'static str {
        "Outputs integers from start to end using the specified step."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        if self.base.options().get_int("step")? == 0 {
            return Err(FlowError::Configuration("Step must not be 0!".to_string()));
        }
        Ok(())
    }

    fn do_execute(&mut self) -> Result<()> {
        let options = self.base.options();
        let (start, end, step) = (options.get_int("start")?, options.get_int("end")?, options.get_int("step")?);
        if step == 0 {
            return Err(FlowError::Configuration("Step must not be 0!".to_string()));
        }

        let mut current = start;
        while (step > 0 && current <= end) || (step < 0 && current >= end) {
            self.base.push_output(json!(current));
            match current.checked_add(step) {
                Some(next) => current = next,
                None => break
            }
        }
        Ok(())
    }
}

/// Emits the value of a variable
#[derive(Clone)]
pub struct GetVariable {
    base: ActorBase
}

impl GetVariable {
    pub fn new() -> Self {
        let mut base = ActorBase::new(ActorKind::Source);
        base.declare(OptionSpec::new(VAR_NAME_OPTION, ValueType::Str, "var", "The name of the variable"));
        Self { base }
    }
}

impl Default for GetVariable {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for GetVariable {
    fn class_name(&self) -> &'static str {
        "sources.GetVariable"
    }

    fn description(&self) -> &'static str {
        "Outputs the value of the specified variable."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        check_variable_name(&self.base.options().get_str(VAR_NAME_OPTION)?)
    }

    fn do_execute(&mut self) -> Result<()> {
        let name = self.base.options().get_str(VAR_NAME_OPTION)?;
        match self.base.variables().get(&name) {
            Some(value) => {
                self.base.push_output(json!(value));
                Ok(())
            }
            None => Err(FlowError::Execution(format!("Variable not available: {}", name)))
        }
    }
}

/// Emits the value of a storage item
#[derive(Clone)]
pub struct GetStorage {
    base: ActorBase
}

impl GetStorage {
    pub fn new() -> Self {
        let mut base = ActorBase::new(ActorKind::Source);
        base.declare(OptionSpec::new(STORAGE_NAME_OPTION, ValueType::Str, "storage", "The name of the storage item"));
        Self { base }
    }
}

impl Default for GetStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for GetStorage {
    fn class_name(&self) -> &'static str {
        "sources.GetStorage"
    }

    fn description(&self) -> &'static str {
        "Outputs the value of the specified storage item."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        require_storage(self.base.storage())?;
        check_storage_name(&self.base.options().get_str(STORAGE_NAME_OPTION)?)
    }

    fn do_execute(&mut self) -> Result<()> {
        let name = self.base.options().get_str(STORAGE_NAME_OPTION)?;
        let value = require_storage(self.base.storage())?.get(&name)?;
        match value {
            Some(value) => {
                self.base.push_output(value);
                Ok(())
            }
            None => Err(FlowError::Execution(format!("Storage item not available: {}", name)))
        }
    }
}

/// Emits the names of the storage items matching a regular expression
#[derive(Clone)]
pub struct ListStorage {
    base: ActorBase
}

impl ListStorage {
    pub fn new() -> Self {
        let mut base = ActorBase::new(ActorKind::Source);
        base.declare(OptionSpec::new(
            "filter",
            ValueType::Str,
            ".*",
            "The regular expression that the names must match"
        ));
        base.declare(OptionSpec::new("invert", ValueType::Bool, false, "Whether to invert the matching sense"));
        Self { base }
    }

    /// The filter anchored at both ends, so it has to match the whole name
    fn pattern(&self) -> Result<Regex> {
        let filter = self.base.options().get_str("filter")?;
        Regex::new(&format!("^(?:{})$", filter))
            .map_err(|e| FlowError::Configuration(format!("Invalid filter '{}': {}", filter, e)))
    }
}

impl Default for ListStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for ListStorage {
    fn class_name(&self) -> &'static str {
        "sources.ListStorage"
    }

    fn description(&self) -> &'static str {
        "Outputs the names of the current storage items."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        require_storage(self.base.storage())?;
        self.pattern().map(|_| ())
    }

    fn do_execute(&mut self) -> Result<()> {
        let pattern = self.pattern()?;
        let invert = self.base.options().get_bool("invert")?;
        let keys = require_storage(self.base.storage())?.keys();
        for key in keys.into_iter().filter(|k| pattern.is_match(k) != invert) {
            self.base.push_output(json!(key));
        }
        Ok(())
    }
}
