//! Transformers: actors consuming a token and producing zero or more

use crate::{
    adapter::{
        STORAGE_NAME_OPTION, VAR_NAME_OPTION, VAR_VALUE_OPTION, check_storage_name, check_variable_name,
        require_storage
    },
    domain::{
        error::{FlowError, Result},
        option::OptionSpec,
        state::ActorKind,
        value::{Value, ValueType, token_to_string}
    },
    port::actor::{Actor, ActorBase}
};

/// Forwards the input unchanged
#[derive(Clone)]
pub struct PassThrough {
    base: ActorBase
}

impl PassThrough {
    pub fn new() -> Self {
        Self { base: ActorBase::new(ActorKind::Transformer) }
    }
}

impl Default for PassThrough {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for PassThrough {
    fn class_name(&self) -> &'static str {
        "transformers.PassThrough"
    }

    fn description(&self) -> &'static str {
        "Dummy actor that just passes through the data."
    }

    actor_base!();

    fn do_execute(&mut self) -> Result<()> {
        if let Some(token) = self.base.take_input() {
            self.base.push_output(token);
        }
        Ok(())
    }
}

/// Stores the passing token (or a fixed value) in a variable and forwards the token
#[derive(Clone)]
pub struct SetVariable {
    base: ActorBase
}

impl SetVariable {
    pub fn new() -> Self {
        let mut base = ActorBase::new(ActorKind::Transformer);
        base.declare(OptionSpec::new(VAR_NAME_OPTION, ValueType::Str, "var", "The name of the variable"));
        base.declare(OptionSpec::new(
            VAR_VALUE_OPTION,
            ValueType::Str,
            "",
            "The value to use instead of data passing through"
        ));
        Self { base }
    }
}

impl Default for SetVariable {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for SetVariable {
    fn class_name(&self) -> &'static str {
        "transformers.SetVariable"
    }

    fn description(&self) -> &'static str {
        "Stores the value coming through as variable under the specified name."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        check_variable_name(&self.base.options().get_str(VAR_NAME_OPTION)?)
    }

    fn do_execute(&mut self) -> Result<()> {
        let Some(token) = self.base.take_input() else {
            return Ok(());
        };
        let name = self.base.options().get_str(VAR_NAME_OPTION)?;
        let value = self.base.options().get_str(VAR_VALUE_OPTION)?;
        let value = if value.is_empty() { token_to_string(&token) } else { value };
        self.base.variables().set(&name, value)?;
        self.base.push_output(token);
        Ok(())
    }
}

/// Adds `inc` to a numeric variable and forwards the token
#[derive(Clone)]
pub struct IncVariable {
    base: ActorBase
}

impl IncVariable {
    pub fn new() -> Self {
        let mut base = ActorBase::new(ActorKind::Transformer);
        base.declare(OptionSpec::new(VAR_NAME_OPTION, ValueType::Str, "var", "The name of the variable"));
        base.declare(OptionSpec::new("inc", ValueType::Float, 1.0, "The amount to add, may be negative"));
        Self { base }
    }
}

impl Default for IncVariable {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for IncVariable {
    fn class_name(&self) -> &'static str {
        "transformers.IncVariable"
    }

    fn description(&self) -> &'static str {
        "Increments the numeric variable by the specified amount and forwards the data."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        check_variable_name(&self.base.options().get_str(VAR_NAME_OPTION)?)
    }

    fn do_execute(&mut self) -> Result<()> {
        let name = self.base.options().get_str(VAR_NAME_OPTION)?;
        let inc = self.base.options().get_float("inc")?;
        let variables = self.base.variables();
        let Some(current) = variables.get(&name) else {
            return Err(FlowError::Execution(format!("Variable not available: {}", name)));
        };

        // integers stay integers as long as the increment is whole
        let next = match current.trim().parse::<i64>() {
            Ok(i) if inc.fract() == 0.0 => match i.checked_add(inc as i64) {
                Some(sum) => Value::Int(sum),
                None => {
                    return Err(FlowError::Execution(format!("Increment overflows: {}={} + {}", name, current, inc)));
                }
            },
            _ => match current.trim().parse::<f64>() {
                Ok(f) => Value::Float(f + inc),
                Err(_) => {
                    return Err(FlowError::Execution(format!("Variable is not numeric: {}={}", name, current)));
                }
            }
        };
        variables.set(&name, self.base.options().write(&next))?;

        if let Some(token) = self.base.take_input() {
            self.base.push_output(token);
        }
        Ok(())
    }
}

/// Stores the passing token in storage and forwards it
#[derive(Clone)]
pub struct SetStorage {
    base: ActorBase
}

impl SetStorage {
    pub fn new() -> Self {
        let mut base = ActorBase::new(ActorKind::Transformer);
        base.declare(OptionSpec::new(STORAGE_NAME_OPTION, ValueType::Str, "storage", "The name of the storage item"));
        Self { base }
    }
}

impl Default for SetStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for SetStorage {
    fn class_name(&self) -> &'static str {
        "transformers.SetStorage"
    }

    fn description(&self) -> &'static str {
        "Stores the value coming through in storage under the specified name."
    }

    actor_base!();

    fn do_setup(&mut self) -> Result<()> {
        require_storage(self.base.storage())?;
        check_storage_name(&self.base.options().get_str(STORAGE_NAME_OPTION)?)
    }

    fn do_execute(&mut self) -> Result<()> {
        let Some(token) = self.base.take_input() else {
            return Ok(());
        };
        let name = self.base.options().get_str(STORAGE_NAME_OPTION)?;
        require_storage(self.base.storage())?.set(&name, token.clone())?;
        self.base.push_output(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::port::actor::Lifecycle;

    #[test]
    fn test_pass_through() {
        let mut actor = PassThrough::new();
        actor.input(json!({"a": 1})).unwrap();
        actor.execute().unwrap();
        assert_eq!(actor.output(), Some(json!({"a": 1})));
        assert!(!actor.has_output());
    }

    #[test]
    fn test_set_variable_from_token_or_value() {
        let mut actor = SetVariable::new().with(VAR_NAME_OPTION, "x").unwrap();
        actor.setup().unwrap();
        actor.input(json!("hello")).unwrap();
        actor.execute().unwrap();
        assert_eq!(actor.base().variables().get("x").as_deref(), Some("hello"));
        assert_eq!(actor.output(), Some(json!("hello")));

        actor.set(VAR_VALUE_OPTION, "fixed").unwrap();
        actor.input(json!(7)).unwrap();
        actor.execute().unwrap();
        assert_eq!(actor.base().variables().get("x").as_deref(), Some("fixed"));
        assert_eq!(actor.output(), Some(json!(7)));
    }

    #[test]
    fn test_set_variable_setup_checks_name() {
        let mut actor = SetVariable::new().with(VAR_NAME_OPTION, "").unwrap();
        assert_eq!(actor.setup().unwrap_err().to_string(), "No variable name provided!");
    }

    #[test]
    fn test_inc_variable() {
        let mut actor = IncVariable::new().with(VAR_NAME_OPTION, "i").unwrap();
        let variables = actor.base().variables().clone();
        actor.input(json!("start")).unwrap();
        assert_eq!(actor.execute().unwrap_err().to_string(), "Variable not available: i");

        variables.set("i", "1").unwrap();
        actor.input(json!("start")).unwrap();
        actor.execute().unwrap();
        assert_eq!(variables.get("i").as_deref(), Some("2"));
        assert_eq!(actor.output(), Some(json!("start")));

        actor.set("inc", 0.5).unwrap();
        actor.execute().unwrap();
        assert_eq!(variables.get("i").as_deref(), Some("2.5"));

        variables.set("i", "abc").unwrap();
        assert!(actor.execute().unwrap_err().to_string().starts_with("Variable is not numeric"));

        actor.set("inc", 1.0).unwrap();
        variables.set("i", &i64::MAX.to_string()).unwrap();
        let err = actor.execute().unwrap_err();
        assert!(matches!(&err, FlowError::Execution(msg) if msg.starts_with("Increment overflows")));
        assert_eq!(variables.get("i"), Some(i64::MAX.to_string()));
    }

    #[test]
    fn test_set_storage_needs_storage() {
        let mut actor = SetStorage::new();
        assert_eq!(actor.setup().unwrap_err().to_string(), "No storage handler available!");
    }
}
