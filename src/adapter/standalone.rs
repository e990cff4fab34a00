//! Standalones: actors run once per pass without exchanging tokens

use std::env;

use tracing::{Level, event};

use crate::{
    adapter::{VAR_NAME_OPTION, VAR_VALUE_OPTION, check_variable_name},
    domain::{
        constant::actor,
        error::{FlowError, Result},
        option::OptionSpec,
        state::ActorKind,
        value::ValueType
    },
    port::actor::{Actor, ActorBase, Lifecycle}
};

const ENV_VAR_OPTION: &str = "env_var";
const ENV_VAR_OPTIONAL_OPTION: &str = "env_var_optional";

/// Sets a variable to a fixed value or to the value of an environment variable
#[derive(Clone)]
pub struct SetVariable {
    base: ActorBase
}

impl SetVariable {
    pub fn new() -> Self {
        let mut base = ActorBase::new(ActorKind::Standalone);
        let specs = [
            OptionSpec::new(VAR_NAME_OPTION, ValueType::Str, "var", "The name of the variable"),
            OptionSpec::new(VAR_VALUE_OPTION, ValueType::Str, "", "The value of the variable; variables get expanded"),
            OptionSpec::new(
                ENV_VAR_OPTION,
                ValueType::Str,
                "",
                "The environment variable to take the value from instead, ignored if empty"
            ),
            OptionSpec::new(
                ENV_VAR_OPTIONAL_OPTION,
                ValueType::Bool,
                false,
                "Whether a missing environment variable leaves the variable untouched instead of failing"
            )
        ];
        for spec in specs {
            base.declare(spec);
        }
        Self { base }
    }

    /// The value to store, `None` when an optional environment variable is missing
    fn value(&self) -> Result<Option<String>> {
        let options = self.base.options();
        let env_var = options.get_str(ENV_VAR_OPTION)?;
        if env_var.is_empty() {
            return Ok(Some(self.base.variables().expand(&options.get_str(VAR_VALUE_OPTION)?)));
        }

        match env::var(&env_var) {
            Ok(value) => Ok(Some(value)),
            Err(_) if options.get_bool(ENV_VAR_OPTIONAL_OPTION)? => Ok(None),
            Err(e) => Err(FlowError::Execution(format!("Environment variable {} not available: {}", env_var, e)))
        }
    }
}

impl Default for SetVariable {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for SetVariable {
    fn class_name(&self) -> &'static str {
        "standalones.SetVariable"
    }

    fn description(&self) -> &'static str {
        "Stores the specified value under the specified name."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        check_variable_name(&self.base.options().get_str(VAR_NAME_OPTION)?)
    }

    fn do_execute(&mut self) -> Result<()> {
        let name = self.base.options().get_str(VAR_NAME_OPTION)?;
        match self.value()? {
            Some(value) => self.base.variables().set(&name, value),
            None => {
                event!(
                    Level::DEBUG,
                    event = actor::MESSAGE,
                    actor = %self.full_name(),
                    message = "optional environment variable missing, variable left untouched"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sets_fixed_value() {
        let mut actor = SetVariable::new().with(VAR_NAME_OPTION, "greeting").unwrap().with(VAR_VALUE_OPTION, "hi @{who}").unwrap();
        actor.base().variables().set("who", "there").unwrap();
        actor.setup().unwrap();
        actor.execute().unwrap();
        assert_eq!(actor.base().variables().get("greeting").as_deref(), Some("hi there"));
    }

    #[test]
    fn test_environment_variable() {
        let mut actor = SetVariable::new()
            .with(VAR_NAME_OPTION, "path")
            .unwrap()
            .with(ENV_VAR_OPTION, "PATH")
            .unwrap();
        actor.execute().unwrap();
        assert_eq!(actor.base().variables().get("path"), env::var("PATH").ok());
    }

    #[test]
    fn test_missing_environment_variable() {
        let name = "ACTORFLOW_TEST_SURELY_UNSET_VARIABLE";
        let mut actor = SetVariable::new().with(VAR_NAME_OPTION, "x").unwrap().with(ENV_VAR_OPTION, name).unwrap();
        assert!(matches!(actor.execute(), Err(FlowError::Execution(msg)) if msg.contains(name)));

        actor.set(ENV_VAR_OPTIONAL_OPTION, true).unwrap();
        actor.execute().unwrap();
        assert!(!actor.base().variables().has("x"));
    }
}
