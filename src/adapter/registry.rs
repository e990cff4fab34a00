//! Registry of constructible actor and condition types, keyed by the `class`
//! string of the serialized record

use std::collections::BTreeMap;

use tabled::Tabled;
use tracing::{Level, event};

use crate::{
    adapter::{condition, control, sink, source, standalone, transformer},
    domain::{
        constant::registry,
        error::{FlowError, Result}
    },
    port::{actor::Actor, condition::BooleanCondition}
};

pub type ActorFactory = fn() -> Box<dyn Actor>;
pub type ConditionFactory = fn() -> Box<dyn BooleanCondition>;

/// One row of the class listing
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct ClassInfo {
    #[tabled(rename = "Class")]
    pub key:         String,
    #[tabled(rename = "Kind")]
    pub kind:        &'static str,
    #[tabled(rename = "Description")]
    pub description: &'static str
}

#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    actors:     BTreeMap<String, ActorFactory>,
    conditions: BTreeMap<String, ConditionFactory>
}

impl ClassRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in actor and condition
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        let actors: [ActorFactory; 22] = [
            || Box::new(source::Start::new()),
            || Box::new(source::ForLoop::new()),
            || Box::new(source::GetVariable::new()),
            || Box::new(source::GetStorage::new()),
            || Box::new(source::ListStorage::new()),
            || Box::new(transformer::PassThrough::new()),
            || Box::new(transformer::SetVariable::new()),
            || Box::new(transformer::IncVariable::new()),
            || Box::new(transformer::SetStorage::new()),
            || Box::new(sink::Null::new()),
            || Box::new(sink::ConsoleOutput::new()),
            || Box::new(standalone::SetVariable::new()),
            || Box::new(control::Flow::new()),
            || Box::new(control::Sequence::new()),
            || Box::new(control::Branch::new()),
            || Box::new(control::Trigger::new()),
            || Box::new(control::ConditionalTrigger::new()),
            || Box::new(control::Tee::new()),
            || Box::new(control::ConditionalTee::new()),
            || Box::new(control::WhileLoop::new()),
            || Box::new(control::Stop::new()),
            || Box::new(control::Sleep::new())
        ];
        for factory in actors {
            registry.register_actor(factory);
        }

        let conditions: [ConditionFactory; 3] = [
            || Box::new(condition::AlwaysTrue::new()),
            || Box::new(condition::AlwaysFalse::new()),
            || Box::new(condition::Expression::new())
        ];
        for factory in conditions {
            registry.register_condition(factory);
        }

        registry
    }

    /// Registers an actor type under the class name its instances report.
    /// A later registration for the same key replaces the earlier one.
    pub fn register_actor(&mut self, factory: ActorFactory) {
        let key = factory().class_name();
        if self.actors.insert(key.to_string(), factory).is_some() {
            event!(Level::DEBUG, event = registry::CLASS_REPLACED, class = key);
        } else {
            event!(Level::TRACE, event = registry::CLASS_REGISTERED, class = key);
        }
    }

    pub fn register_condition(&mut self, factory: ConditionFactory) {
        let key = factory().class_name();
        if self.conditions.insert(key.to_string(), factory).is_some() {
            event!(Level::DEBUG, event = registry::CLASS_REPLACED, class = key);
        } else {
            event!(Level::TRACE, event = registry::CLASS_REGISTERED, class = key);
        }
    }

    /// Fresh instance of a registered actor type
    pub fn create_actor(&self, key: &str) -> Result<Box<dyn Actor>> {
        self.actors.get(key).map(|factory| factory()).ok_or_else(|| FlowError::unregistered_type(key))
    }

    pub fn create_condition(&self, key: &str) -> Result<Box<dyn BooleanCondition>> {
        self.conditions.get(key).map(|factory| factory()).ok_or_else(|| FlowError::unregistered_type(key))
    }

    /// Check if an actor or condition type is registered under the key.
    pub fn has(&self, key: &str) -> bool {
        self.actors.contains_key(key) || self.conditions.contains_key(key)
    }

    /// Get all registered keys, actors first, each group sorted.
    pub fn names(&self) -> Vec<&str> {
        self.actors.keys().chain(self.conditions.keys()).map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.actors.len() + self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty() && self.conditions.is_empty()
    }

    /// Rows for the class listing, optionally limited to keys containing `filter`
    pub fn describe(&self, filter: Option<&str>) -> Vec<ClassInfo> {
        let matches = |key: &str| filter.is_none_or(|f| key.to_lowercase().contains(&f.to_lowercase()));

        let actors = self.actors.iter().filter(|(key, _)| matches(key.as_str())).map(|(key, factory)| {
            let actor = factory();
            ClassInfo { key: key.clone(), kind: actor.base().kind().as_str(), description: actor.description() }
        });
        let conditions = self.conditions.iter().filter(|(key, _)| matches(key.as_str())).map(|(key, factory)| ClassInfo {
            key:         key.clone(),
            kind:        "condition",
            description: factory().description()
        });
        actors.chain(conditions).collect()
    }

    /// Help page of a registered type
    pub fn help(&self, key: &str) -> Result<String> {
        use crate::port::{actor::Lifecycle, condition::Evaluate};

        if let Ok(actor) = self.create_actor(key) {
            return Ok(actor.to_help());
        }
        self.create_condition(key).map(|condition| condition.to_help())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_operations() {
        let mut registry = ClassRegistry::new();
        assert!(registry.is_empty());
        registry.register_actor(|| Box::new(sink::Null::new()));
        registry.register_actor(|| Box::new(sink::Null::new()));
        registry.register_condition(|| Box::new(condition::AlwaysTrue::new()));

        assert!(registry.has("sinks.Null"));
        assert!(registry.has("conditions.AlwaysTrue"));
        assert!(!registry.has("sinks.Missing"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["sinks.Null", "conditions.AlwaysTrue"]);
    }

    #[test]
    fn test_defaults_create_what_they_advertise() {
        let registry = ClassRegistry::with_defaults();
        assert_eq!(registry.len(), 25);
        for key in registry.names() {
            if let Ok(actor) = registry.create_actor(key) {
                assert_eq!(actor.class_name(), key);
                assert!(!actor.description().is_empty());
            } else {
                assert_eq!(registry.create_condition(key).unwrap().class_name(), key);
            }
        }
    }

    #[test]
    fn test_unknown_keys_fail_fast() {
        let registry = ClassRegistry::with_defaults();
        let err = registry.create_actor("conditions.Expression").unwrap_err();
        assert_eq!(err.to_string(), "Unregistered type: conditions.Expression");
        assert!(registry.create_condition("nope").is_err());
        assert!(registry.help("nope").is_err());
    }

    #[test]
    fn test_describe_filters_case_insensitively() {
        let registry = ClassRegistry::with_defaults();
        let rows = registry.describe(Some("variable"));
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["sources.GetVariable", "standalones.SetVariable", "transformers.IncVariable", "transformers.SetVariable"]
        );
        assert_eq!(rows[1].kind, "standalone");

        let rows = registry.describe(Some("Always"));
        assert!(rows.iter().all(|r| r.kind == "condition"));
    }

    #[test]
    fn test_help_covers_conditions() {
        let registry = ClassRegistry::with_defaults();
        assert!(registry.help("conditions.Expression").unwrap().contains("expression/str"));
        assert!(registry.help("controls.WhileLoop").unwrap().starts_with("controls.WhileLoop\n"));
    }
}
