use std::fmt;

use serde_json::Value as JsonValue;

use crate::{
    adapter::persist::condition_to_dict,
    domain::{
        error::{FlowError, Result},
        option::OptionManager,
        value::{Token, Value},
        variable::Variables
    }
};

/// The actor a condition belongs to, as far as evaluation needs it
#[derive(Debug, Clone)]
pub struct ConditionOwner {
    pub full_name: String,
    pub variables: Variables
}

/// Options and owner shared by every condition
#[derive(Clone, Default)]
pub struct ConditionBase {
    pub options: OptionManager,
    owner:       Option<ConditionOwner>
}

impl ConditionBase {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Boolean test evaluated by control actors against the current token
///
/// A condition belongs to exactly one actor. Evaluating it before an owner has
/// been attached is a construction bug and reported as an error.
pub trait BooleanCondition: ConditionClone + Send {
    /// Stable registry key, e.g. `conditions.Expression`
    fn class_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn base(&self) -> &ConditionBase;

    fn base_mut(&mut self) -> &mut ConditionBase;

    /// Evaluates the condition; the owner is guaranteed to be attached
    fn do_evaluate(&self, owner: &ConditionOwner, token: Option<&Token>) -> Result<bool>;
}

/// Object-safe cloning for boxed conditions
pub trait ConditionClone {
    fn clone_box(&self) -> Box<dyn BooleanCondition>;
}

impl<T> ConditionClone for T
where
    T: BooleanCondition + Clone + 'static
{
    fn clone_box(&self) -> Box<dyn BooleanCondition> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn BooleanCondition> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl fmt::Debug for dyn BooleanCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooleanCondition")
            .field("class", &self.class_name())
            .field("owner", &self.owner().map(|o| o.full_name.as_str()))
            .finish()
    }
}

/// Evaluation and configuration helpers shared by every condition
pub trait Evaluate: BooleanCondition {
    fn owner(&self) -> Option<&ConditionOwner> {
        self.base().owner.as_ref()
    }

    /// Attaches the owning actor; option variables resolve against its store
    fn set_owner(&mut self, owner: ConditionOwner) {
        let base = self.base_mut();
        base.options.set_variables(Some(owner.variables.clone()));
        base.owner = Some(owner);
    }

    fn evaluate(&self, token: Option<&Token>) -> Result<bool> {
        let Some(owner) = self.owner() else {
            return Err(FlowError::Evaluation("No owning actor set!".to_string()));
        };
        self.do_evaluate(owner, token)
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.base().options.get(name)
    }

    fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<bool> {
        self.base_mut().options.set(name, value)
    }

    fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self>
    where
        Self: Sized
    {
        self.base_mut().options.set(name, value)?;
        Ok(self)
    }

    fn to_dict(&self, skip_default: bool) -> Result<JsonValue> {
        condition_to_dict(self, skip_default)
    }

    fn to_help(&self) -> String {
        let title = self.class_name();
        format!(
            "{}\n{}\n\n{}\n\n{}\n",
            title,
            "=".repeat(title.len()),
            self.description(),
            self.base().options.to_help()
        )
    }
}

impl<C> Evaluate for C where C: BooleanCondition + ?Sized {}
