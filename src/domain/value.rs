//! Option values and the tokens passed between actors

use std::fmt;

use crate::port::{actor::Actor, condition::BooleanCondition};

/// Unit of data handed from a producer to a consumer
pub type Token = serde_json::Value;

/// Renders a token the way variables and console output expect it: strings
/// without quotes, everything else as JSON
pub fn token_to_string(token: &Token) -> String {
    match token {
        Token::String(s) => s.clone(),
        other => other.to_string()
    }
}

/// Declared type of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Str,
    List,
    Actor,
    Condition
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::List => "list",
            ValueType::Actor => "actor",
            ValueType::Condition => "condition"
        }
    }

    /// Whether values of this type are nested objects that always serialize
    pub fn is_object(&self) -> bool {
        matches!(self, ValueType::Actor | ValueType::Condition)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current value of an option
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Actor(Box<dyn Actor>),
    Condition(Box<dyn BooleanCondition>)
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::List(_) => ValueType::List,
            Value::Actor(_) => ValueType::Actor,
            Value::Condition(_) => ValueType::Condition
        }
    }

    /// Converts the value to the expected type where that is lossless
    /// (integers widen to floats); hands the value back otherwise
    pub fn coerce(self, expected: ValueType) -> std::result::Result<Value, Value> {
        match (self, expected) {
            (Value::Int(i), ValueType::Float) => Ok(Value::Float(i as f64)),
            (value, expected) if value.value_type() == expected => Ok(value),
            (value, _) => Err(value)
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use crate::port::{actor::Lifecycle, condition::Evaluate};

        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Actor(a), Value::Actor(b)) => a.to_dict(false).ok() == b.to_dict(false).ok(),
            (Value::Condition(a), Value::Condition(b)) => a.to_dict(false).ok() == b.to_dict(false).ok(),
            _ => false
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use crate::port::condition::Evaluate;

        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Actor(actor) => f.write_str(actor.class_name()),
            Value::Condition(condition) => match condition.to_dict(false) {
                Ok(dict) => write!(f, "{}", dict),
                Err(_) => f.write_str(condition.class_name())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Box<dyn Actor>> for Value {
    fn from(value: Box<dyn Actor>) -> Self {
        Value::Actor(value)
    }
}

impl From<Box<dyn BooleanCondition>> for Value {
    fn from(value: Box<dyn BooleanCondition>) -> Self {
        Value::Condition(value)
    }
}

impl From<Vec<Box<dyn Actor>>> for Value {
    fn from(value: Vec<Box<dyn Actor>>) -> Self {
        Value::List(value.into_iter().map(Value::Actor).collect())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_coerce_widens_ints_only() {
        assert_eq!(Value::Int(2).coerce(ValueType::Float), Ok(Value::Float(2.0)));
        assert_eq!(Value::Float(2.5).coerce(ValueType::Int), Err(Value::Float(2.5)));
        assert_eq!(Value::from("x").coerce(ValueType::Str), Ok(Value::Str("x".to_string())));
        assert!(Value::from("x").coerce(ValueType::Bool).is_err());
    }

    #[test]
    fn test_token_to_string() {
        assert_eq!(token_to_string(&json!("abc")), "abc");
        assert_eq!(token_to_string(&json!(3)), "3");
        assert_eq!(token_to_string(&json!([1, "a"])), "[1,\"a\"]");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::List(vec![Value::Int(1), Value::from("a")]).to_string(), "[1, a]");
    }
}
