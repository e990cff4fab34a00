//! Typed, introspectable options with late-bound variables
//!
//! Every actor and condition owns an [`OptionManager`]. The declared shape of
//! the options (name, type, default, help) is fixed once the owner has been
//! constructed; only the current values change afterwards. An option may be
//! attached to a variable, in which case reads resolve the variable and convert
//! its string value back to the declared type.

use std::{collections::HashMap, fmt, sync::Arc};

use once_cell::sync::Lazy;
use serde_json::{Map, Number, Value as JsonValue};
use tracing::{Level, event};

use crate::{
    adapter::{
        persist::{actor_to_dict, condition_to_dict, dict_to_actor, dict_to_condition},
        registry::ClassRegistry
    },
    domain::{
        constant::option,
        error::{FlowError, Result},
        value::{Value, ValueType},
        variable::{Variables, is_valid_name, is_var, pad_var, unpad_var}
    },
    port::{actor::Actor, condition::BooleanCondition}
};

/// Keys used by the serialized `{class, options}` record
pub const RESERVED_NAMES: &[&str] = &["class"];

/// Parses a variable's string value into a typed value
pub type StringReader = fn(&str) -> Result<Value>;
/// Renders a typed value as the string stored in a variable
pub type StringWriter = fn(&Value) -> String;
/// Per-option object → primitive hook
pub type DictWriter = fn(&Value) -> Result<JsonValue>;
/// Per-option primitive → object hook
pub type DictReader = fn(&JsonValue, &ClassRegistry) -> Result<Value>;

/// String reader/writer tables keyed by value type
#[derive(Clone, Default)]
pub struct Conversions {
    readers: HashMap<ValueType, StringReader>,
    writers: HashMap<ValueType, StringWriter>
}

/// Conversions for the primitive types, shared by every option manager that
/// was not given its own table
pub static DEFAULT_CONVERSIONS: Lazy<Arc<Conversions>> = Lazy::new(|| Arc::new(Conversions::with_defaults()));

impl Conversions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Readers for bool, int, float and str, plus JSON array text for lists in
    /// both directions
    pub fn with_defaults() -> Self {
        let mut conversions = Self::new();
        conversions.register_reader(ValueType::Bool, read_bool);
        conversions.register_reader(ValueType::Int, read_int);
        conversions.register_reader(ValueType::Float, read_float);
        conversions.register_reader(ValueType::Str, read_str);
        conversions.register_reader(ValueType::List, read_list);
        conversions.register_writer(ValueType::List, write_list);
        conversions
    }

    pub fn register_reader(&mut self, value_type: ValueType, reader: StringReader) {
        self.readers.insert(value_type, reader);
    }

    pub fn register_writer(&mut self, value_type: ValueType, writer: StringWriter) {
        self.writers.insert(value_type, writer);
    }

    pub fn read(&self, value_type: ValueType, text: &str) -> Result<Value> {
        match self.readers.get(&value_type) {
            Some(reader) => reader(text),
            None => Err(FlowError::Configuration(format!("No string reader registered for type: {}", value_type)))
        }
    }

    pub fn write(&self, value: &Value) -> String {
        match self.writers.get(&value.value_type()) {
            Some(writer) => writer(value),
            None => value.to_string()
        }
    }
}

fn read_bool(text: &str) -> Result<Value> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Value::Bool(true)),
        "false" | "0" | "no" => Ok(Value::Bool(false)),
        other => Err(FlowError::Configuration(format!("Not a boolean: {}", other)))
    }
}

fn read_int(text: &str) -> Result<Value> {
    text.trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|e| FlowError::Configuration(format!("Not an integer: {} ({})", text, e)))
}

fn read_float(text: &str) -> Result<Value> {
    text.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|e| FlowError::Configuration(format!("Not a number: {} ({})", text, e)))
}

fn read_str(text: &str) -> Result<Value> {
    Ok(Value::Str(text.to_string()))
}

fn read_list(text: &str) -> Result<Value> {
    let parsed: JsonValue = serde_json::from_str(text)?;
    match parsed {
        JsonValue::Array(items) => items.iter().map(primitive_from_json).collect::<Result<Vec<_>>>().map(Value::List),
        other => Err(FlowError::Configuration(format!("Not a list: {}", other)))
    }
}

fn write_list(value: &Value) -> String {
    match value_to_json(value, false) {
        Ok(json) => json.to_string(),
        Err(_) => value.to_string()
    }
}

/// Declared shape of a single option
#[derive(Clone)]
pub struct OptionSpec {
    pub name:         String,
    pub value_type:   ValueType,
    pub default:      Value,
    pub help:         String,
    /// Base type of the elements of a list option
    pub element_type: Option<ValueType>,
    pub to_dict:      Option<DictWriter>,
    pub from_dict:    Option<DictReader>
}

impl OptionSpec {
    pub fn new(name: &str, value_type: ValueType, default: impl Into<Value>, help: &str) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            default: default.into(),
            help: help.to_string(),
            element_type: None,
            to_dict: None,
            from_dict: None
        }
    }

    pub fn list_of(name: &str, element_type: ValueType, default: Vec<Value>, help: &str) -> Self {
        Self { element_type: Some(element_type), ..Self::new(name, ValueType::List, Value::List(default), help) }
    }

    pub fn with_dict_handlers(mut self, to_dict: DictWriter, from_dict: DictReader) -> Self {
        self.to_dict = Some(to_dict);
        self.from_dict = Some(from_dict);
        self
    }

    /// Options holding actors or conditions are always serialized
    fn holds_objects(&self) -> bool {
        self.value_type.is_object() || self.element_type.is_some_and(|t| t.is_object())
    }

    fn type_label(&self) -> String {
        match self.element_type {
            Some(element) => format!("{}[{}]", self.value_type, element),
            None => self.value_type.to_string()
        }
    }
}

impl OptionSpec {
    fn help_block(&self, conversions: &Conversions) -> String {
        format!("{}/{}: {}\n   {}", self.name, self.type_label(), conversions.write(&self.default), self.help)
    }
}

/// Ordered option declarations plus their current values and variable bindings
#[derive(Clone)]
pub struct OptionManager {
    specs:       Vec<OptionSpec>,
    values:      HashMap<String, Value>,
    /// option name → variable name
    vars:        HashMap<String, String>,
    variables:   Option<Variables>,
    conversions: Arc<Conversions>
}

impl Default for OptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OptionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionManager")
            .field("options", &self.names())
            .field("vars", &self.vars)
            .finish()
    }
}

impl OptionManager {
    pub fn new() -> Self {
        Self::with_conversions(Arc::clone(&DEFAULT_CONVERSIONS))
    }

    pub fn with_conversions(conversions: Arc<Conversions>) -> Self {
        Self { specs: Vec::new(), values: HashMap::new(), vars: HashMap::new(), variables: None, conversions }
    }

    /// Registers an option; declaring the same name again replaces the earlier
    /// declaration in place
    pub fn declare(&mut self, spec: OptionSpec) -> Result<()> {
        if RESERVED_NAMES.contains(&spec.name.as_str()) {
            return Err(FlowError::reserved_name(&spec.name));
        }
        if spec.default.value_type() != spec.value_type {
            return Err(FlowError::invalid_option_type(&spec.name, spec.value_type, spec.default.value_type()));
        }
        match self.specs.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec)
        }
        Ok(())
    }

    /// Declares an option fixed by the declaring type; a rejected spec is a bug
    /// in that type, so it trips debug builds and is logged in release builds
    pub fn declare_builtin(&mut self, spec: OptionSpec) {
        let name = spec.name.clone();
        if let Err(e) = self.declare(spec) {
            event!(Level::ERROR, event = option::DECLARE_REJECTED, option = %name, error = %e);
            debug_assert!(false, "Built-in option '{}' rejected: {}", name, e);
        }
    }

    /// Shorthand for declaring a scalar option
    pub fn add(&mut self, name: &str, value_type: ValueType, default: impl Into<Value>, help: &str) -> Result<()> {
        self.declare(OptionSpec::new(name, value_type, default, help))
    }

    pub fn has(&self, name: &str) -> bool {
        self.specs.iter().any(|s| s.name == name)
    }

    pub fn spec(&self, name: &str) -> Option<&OptionSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn specs(&self) -> &[OptionSpec] {
        &self.specs
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    /// Variable store used to resolve attached variables
    pub fn set_variables(&mut self, variables: Option<Variables>) {
        self.variables = variables;
    }

    /// Sets a literal value or, for a `@{name}` string, attaches the variable.
    /// Unknown names are logged and ignored (`Ok(false)`); a value of the wrong
    /// type is a configuration error.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        let Some(expected) = self.spec(name).map(|s| s.value_type) else {
            event!(Level::WARN, event = option::UNKNOWN_OPTION, option = name);
            return Ok(false);
        };

        if let Value::Str(text) = &value
            && is_var(text)
        {
            let var = unpad_var(text).to_string();
            return self.attach(name, &var);
        }

        match value.coerce(expected) {
            Ok(value) => {
                self.values.insert(name.to_string(), value);
                Ok(true)
            }
            Err(value) => Err(FlowError::invalid_option_type(name, expected, value.value_type()))
        }
    }

    /// Binds the option to a variable; the literal value stays untouched
    pub fn attach(&mut self, name: &str, var: &str) -> Result<bool> {
        if !self.has(name) {
            event!(Level::WARN, event = option::UNKNOWN_OPTION, option = name);
            return Ok(false);
        }
        if !is_valid_name(var) {
            return Err(FlowError::invalid_variable_name(var));
        }
        event!(Level::DEBUG, event = option::VARIABLE_ATTACHED, option = name, variable = var);
        self.vars.insert(name.to_string(), var.to_string());
        Ok(true)
    }

    pub fn detach(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }

    /// Name of the variable attached to the option
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Current value: the resolved variable if one is attached and present in
    /// the store, else the literal, else the default. Unknown names give `None`.
    pub fn get(&self, name: &str) -> Option<Value> {
        let spec = self.spec(name)?;

        if let Some(resolved) = self.resolve_variable(spec) {
            return Some(resolved);
        }
        self.values.get(name).cloned().or_else(|| Some(spec.default.clone()))
    }

    fn resolve_variable(&self, spec: &OptionSpec) -> Option<Value> {
        let var = self.vars.get(&spec.name)?;
        let Some(text) = self.variables.as_ref().and_then(|v| v.get(var)) else {
            event!(Level::TRACE, event = option::VARIABLE_UNRESOLVED, option = %spec.name, variable = %var);
            return None;
        };
        match self.conversions.read(spec.value_type, &text) {
            Ok(value) => Some(value),
            Err(e) => {
                event!(Level::WARN, event = option::CONVERSION_FAILED, option = %spec.name, variable = %var, error = %e);
                None
            }
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        self.typed(name, Value::as_bool)
    }

    pub fn get_int(&self, name: &str) -> Result<i64> {
        self.typed(name, Value::as_int)
    }

    pub fn get_float(&self, name: &str) -> Result<f64> {
        self.typed(name, Value::as_float)
    }

    pub fn get_str(&self, name: &str) -> Result<String> {
        self.typed(name, |v| v.as_str().map(str::to_string))
    }

    fn typed<T>(&self, name: &str, extract: impl Fn(&Value) -> Option<T>) -> Result<T> {
        let value = self.get(name).ok_or_else(|| FlowError::Configuration(format!("Unknown option: {}", name)))?;
        extract(&value).ok_or_else(|| {
            let expected = self.spec(name).map(|s| s.value_type.as_str()).unwrap_or("?");
            FlowError::invalid_option_type(name, expected, value.value_type())
        })
    }

    /// Mutable access to the actors held by an actor or list-of-actor option.
    /// A default value is copied into the literal slot first so changes stick.
    pub fn actors_mut(&mut self, name: &str) -> Vec<&mut dyn Actor> {
        if !self.materialize(name) {
            return Vec::new();
        }
        match self.values.get_mut(name) {
            Some(Value::Actor(actor)) => vec![actor.as_mut() as &mut dyn Actor],
            Some(Value::List(items)) => items
                .iter_mut()
                .filter_map(|item| match item {
                    Value::Actor(actor) => Some(actor.as_mut() as &mut dyn Actor),
                    _ => None
                })
                .collect(),
            _ => Vec::new()
        }
    }

    /// Read access to the actors held by an option, resolving like `get`
    pub fn actors(&self, name: &str) -> Vec<&dyn Actor> {
        let slot = match self.values.get(name) {
            Some(value) => Some(value),
            None => self.spec(name).map(|s| &s.default)
        };
        match slot {
            Some(Value::Actor(actor)) => vec![actor.as_ref() as &dyn Actor],
            Some(Value::List(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Actor(actor) => Some(actor.as_ref() as &dyn Actor),
                    _ => None
                })
                .collect(),
            _ => Vec::new()
        }
    }

    /// Mutable access to a condition option, see [`OptionManager::actors_mut`]
    pub fn condition_mut(&mut self, name: &str) -> Option<&mut dyn BooleanCondition> {
        if !self.materialize(name) {
            return None;
        }
        match self.values.get_mut(name) {
            Some(Value::Condition(condition)) => Some(condition.as_mut() as &mut dyn BooleanCondition),
            _ => None
        }
    }

    /// Mutable access to every condition option in declaration order
    pub fn conditions_mut(&mut self) -> Vec<&mut dyn BooleanCondition> {
        let names: Vec<String> =
            self.specs.iter().filter(|s| s.value_type == ValueType::Condition).map(|s| s.name.clone()).collect();
        for name in &names {
            self.materialize(name);
        }
        self.values
            .iter_mut()
            .filter(|(key, _)| names.contains(key))
            .filter_map(|(_, value)| match value {
                Value::Condition(condition) => Some(condition.as_mut() as &mut dyn BooleanCondition),
                _ => None
            })
            .collect()
    }

    fn materialize(&mut self, name: &str) -> bool {
        if self.values.contains_key(name) {
            return true;
        }
        match self.spec(name).map(|s| s.default.clone()) {
            Some(default) => {
                self.values.insert(name.to_string(), default);
                true
            }
            None => false
        }
    }

    /// Drops all literals so the defaults apply again; variable bindings stay
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Serializable mapping of the options in declaration order
    pub fn to_dict(&self, skip_default: bool) -> Result<Map<String, JsonValue>> {
        let mut result = Map::new();
        for spec in &self.specs {
            if let Some(var) = self.vars.get(&spec.name) {
                result.insert(spec.name.clone(), JsonValue::String(pad_var(var)));
                continue;
            }

            let value = self.values.get(&spec.name).unwrap_or(&spec.default);
            if skip_default && spec.to_dict.is_none() && !spec.holds_objects() && *value == spec.default {
                continue;
            }

            let json = match spec.to_dict {
                Some(writer) => writer(value)?,
                None => value_to_json(value, skip_default)?
            };
            result.insert(spec.name.clone(), json);
        }
        Ok(result)
    }

    /// Applies a mapping produced by `to_dict`; unknown keys are logged and
    /// skipped, `@{name}` strings attach variables
    pub fn from_dict(&mut self, dict: &Map<String, JsonValue>, registry: &ClassRegistry) -> Result<()> {
        for (key, json) in dict {
            let Some(spec) = self.spec(key).cloned() else {
                event!(Level::WARN, event = option::UNKNOWN_OPTION, option = %key);
                continue;
            };

            if let JsonValue::String(text) = json
                && is_var(text)
            {
                self.attach(key, unpad_var(text))?;
                continue;
            }

            let value = match spec.from_dict {
                Some(reader) => reader(json, registry)?,
                None => json_to_value(json, spec.value_type, spec.element_type, registry, &self.conversions)
                    .map_err(|e| FlowError::Configuration(format!("Option '{}': {}", key, e)))?
            };
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Renders a value the way it is stored in a variable
    pub fn write(&self, value: &Value) -> String {
        self.conversions.write(value)
    }

    /// One block per option: `name/type: default` followed by the help text
    pub fn to_help(&self) -> String {
        self.specs.iter().map(|s| s.help_block(&self.conversions)).collect::<Vec<_>>().join("\n")
    }
}

/// Object → primitive conversion used when no per-option writer is set;
/// `skip_default` applies to nested actors and conditions
pub fn value_to_json(value: &Value, skip_default: bool) -> Result<JsonValue> {
    Ok(match value {
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => JsonValue::Number(
            Number::from_f64(*f).ok_or_else(|| FlowError::Serialization(format!("Not a finite number: {}", f)))?
        ),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::List(items) => JsonValue::Array(items.iter().map(|item| value_to_json(item, skip_default)).collect::<Result<Vec<_>>>()?),
        Value::Actor(actor) => actor_to_dict(actor.as_ref(), skip_default)?,
        Value::Condition(condition) => condition_to_dict(condition.as_ref(), skip_default)?
    })
}

/// Primitive → object conversion used when no per-option reader is set
pub fn json_to_value(
    json: &JsonValue,
    value_type: ValueType,
    element_type: Option<ValueType>,
    registry: &ClassRegistry,
    conversions: &Conversions
) -> Result<Value> {
    match (value_type, json) {
        (ValueType::Bool, JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
        (ValueType::Int, JsonValue::Number(n)) if n.is_i64() => Ok(Value::Int(n.as_i64().unwrap_or_default())),
        (ValueType::Float, JsonValue::Number(n)) => Ok(Value::Float(n.as_f64().unwrap_or_default())),
        (ValueType::Str, JsonValue::String(s)) => Ok(Value::Str(s.clone())),
        (ValueType::List, JsonValue::Array(items)) => items
            .iter()
            .map(|item| match element_type {
                Some(element) => json_to_value(item, element, None, registry, conversions),
                None => primitive_from_json(item)
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        (ValueType::Actor, JsonValue::Object(_)) => dict_to_actor(json, registry).map(Value::Actor),
        (ValueType::Condition, JsonValue::Object(_)) => dict_to_condition(json, registry).map(Value::Condition),
        // quoted scalars, as YAML files sometimes carry them
        (ValueType::Bool | ValueType::Int | ValueType::Float, JsonValue::String(s)) => conversions.read(value_type, s),
        (expected, other) => Err(FlowError::Configuration(format!("Expected {}, got: {}", expected, other)))
    }
}

fn primitive_from_json(json: &JsonValue) -> Result<Value> {
    match json {
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => Ok(Value::Float(n.as_f64().unwrap_or_default()))
        },
        JsonValue::String(s) => Ok(Value::Str(s.clone())),
        JsonValue::Array(items) => items.iter().map(primitive_from_json).collect::<Result<Vec<_>>>().map(Value::List),
        other => Err(FlowError::Configuration(format!("Untyped list element must be a primitive: {}", other)))
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn from_dict_to_dict_is_idempotent(
            dir in "[a-z/]{0,12}",
            count in any::<i64>(),
            ratio in -1.0e6f64..1.0e6,
            verbose in any::<bool>(),
            var in proptest::option::of("[a-z_]{1,8}")
        ) {
            let registry = ClassRegistry::new();
            let fresh = || {
                let mut options = OptionManager::new();
                options.add("dir", ValueType::Str, ".", "").unwrap();
                options.add("count", ValueType::Int, 0, "").unwrap();
                options.add("ratio", ValueType::Float, 0.0, "").unwrap();
                options.add("verbose", ValueType::Bool, false, "").unwrap();
                options
            };

            let mut dict = serde_json::Map::new();
            dict.insert("dir".into(), match &var {
                Some(v) => JsonValue::String(pad_var(v)),
                None => JsonValue::String(dir.clone())
            });
            dict.insert("count".into(), count.into());
            dict.insert("ratio".into(), serde_json::json!(ratio));
            dict.insert("verbose".into(), verbose.into());

            let mut first = fresh();
            first.from_dict(&dict, &registry).unwrap();
            let mut second = fresh();
            second.from_dict(&first.to_dict(false).unwrap(), &registry).unwrap();

            prop_assert_eq!(first.to_dict(false).unwrap(), second.to_dict(false).unwrap());
            for name in ["dir", "count", "ratio", "verbose"] {
                prop_assert_eq!(first.get(name), second.get(name));
                prop_assert_eq!(first.variable(name), second.variable(name));
            }
        }
    }
}
