//! Built-in boolean conditions

use tera::{Context as TeraContext, Tera};

use crate::{
    domain::{
        error::{FlowError, Result},
        option::OptionSpec,
        value::{Token, ValueType},
        variable::Variables
    },
    port::condition::{BooleanCondition, ConditionBase, ConditionOwner}
};

macro_rules! condition_accessors {
    () => {
        fn base(&self) -> &ConditionBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ConditionBase {
            &mut self.base
        }
    };
}

#[derive(Clone, Default)]
pub struct AlwaysTrue {
    base: ConditionBase
}

impl AlwaysTrue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BooleanCondition for AlwaysTrue {
    fn class_name(&self) -> &'static str {
        "conditions.AlwaysTrue"
    }

    fn description(&self) -> &'static str {
        "Always evaluates to true."
    }

    condition_accessors!();

    fn do_evaluate(&self, _owner: &ConditionOwner, _token: Option<&Token>) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Clone, Default)]
pub struct AlwaysFalse {
    base: ConditionBase
}

impl AlwaysFalse {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BooleanCondition for AlwaysFalse {
    fn class_name(&self) -> &'static str {
        "conditions.AlwaysFalse"
    }

    fn description(&self) -> &'static str {
        "Always evaluates to false."
    }

    condition_accessors!();

    fn do_evaluate(&self, _owner: &ConditionOwner, _token: Option<&Token>) -> Result<bool> {
        Ok(false)
    }
}

pub const EXPRESSION_OPTION: &str = "expression";

/// Boolean expression evaluated as a template `if` test
///
/// `@{name}` references are expanded first. Variables are also available by
/// name (numbers and booleans parsed) and the current token as `token`, so
/// `@{i} < 5`, `i < 5` and `token == "x"` are all valid expressions.
#[derive(Clone)]
pub struct Expression {
    base: ConditionBase
}

impl Expression {
    pub fn new() -> Self {
        let mut base = ConditionBase::new();
        base.options.declare_builtin(OptionSpec::new(
            EXPRESSION_OPTION,
            ValueType::Str,
            "true",
            "The boolean expression to evaluate, e.g. '@{i} < 10' or 'token == \"done\"'"
        ));
        Self { base }
    }
}

impl Default for Expression {
    fn default() -> Self {
        Self::new()
    }
}

impl BooleanCondition for Expression {
    fn class_name(&self) -> &'static str {
        "conditions.Expression"
    }

    fn description(&self) -> &'static str {
        "Evaluates a boolean expression over the variables and the current token."
    }

    condition_accessors!();

    fn do_evaluate(&self, owner: &ConditionOwner, token: Option<&Token>) -> Result<bool> {
        let expression = self.base.options.get_str(EXPRESSION_OPTION)?;
        let expanded = owner.variables.expand(&expression);
        let template = format!("{{% if {} %}}true{{% else %}}false{{% endif %}}", expanded);

        let context = evaluation_context(&owner.variables, token);
        match Tera::one_off(&template, &context, false) {
            Ok(rendered) => Ok(rendered == "true"),
            Err(e) => Err(FlowError::Evaluation(format!(
                "Failed to evaluate '{}' for {}: {}",
                expanded,
                owner.full_name,
                FlowError::from(e)
            )))
        }
    }
}

/// Variables as typed template values plus the current token
fn evaluation_context(variables: &Variables, token: Option<&Token>) -> TeraContext {
    let mut context = TeraContext::new();
    // dashes are not valid in template identifiers
    for (name, value) in variables.snapshot().into_iter().filter(|(name, _)| !name.contains('-')) {
        if let Ok(i) = value.parse::<i64>() {
            context.insert(name, &i);
        } else if let Ok(f) = value.parse::<f64>() {
            context.insert(name, &f);
        } else if let Ok(b) = value.parse::<bool>() {
            context.insert(name, &b);
        } else {
            context.insert(name, &value);
        }
    }
    if let Some(token) = token {
        context.insert("token", token);
    }
    context
}
