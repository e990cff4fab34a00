//! The actor contract
//!
//! Concrete actors implement [`Actor`]: a handful of required accessors and
//! optional hooks. Everything a director or parent calls (`setup`, `execute`,
//! `stop_execution`, ...) lives in the [`Lifecycle`] extension trait, which is
//! implemented for every actor, so the lifecycle bookkeeping exists once.

use std::{
    collections::{HashSet, VecDeque},
    fmt,
    panic::{AssertUnwindSafe, catch_unwind}
};

use serde_json::Value as JsonValue;
use tracing::{Level, event};

use crate::{
    adapter::persist::actor_to_dict,
    domain::{
        constant::actor,
        context::{ActorContext, StopCheck, StopSignal},
        error::{FlowError, Result},
        option::{OptionManager, OptionSpec},
        state::{ActorKind, ActorState},
        storage::Storage,
        value::{Token, Value, ValueType},
        variable::Variables
    },
    port::condition::{ConditionOwner, Evaluate}
};

pub const NAME_OPTION: &str = "name";
pub const DEBUG_OPTION: &str = "debug";
pub const STOP_ON_ERROR_OPTION: &str = "stop_on_error";
pub const ACTORS_OPTION: &str = "actors";

/// Logs at INFO for actors with `debug` enabled, at DEBUG otherwise
macro_rules! actor_event {
    ($debug:expr, $($field:tt)*) => {
        if $debug {
            event!(Level::INFO, $($field)*)
        } else {
            event!(Level::DEBUG, $($field)*)
        }
    };
}

/// A named, configurable unit of work
pub trait Actor: ActorClone + Send {
    /// Stable registry key, e.g. `sources.ForLoop`
    fn class_name(&self) -> &'static str;

    /// One-line description used by the help output
    fn description(&self) -> &'static str;

    fn base(&self) -> &ActorBase;

    fn base_mut(&mut self) -> &mut ActorBase;

    /// Restores transient per-run state; called after every configuration change
    fn reset(&mut self) {}

    /// Validates the configuration before a run
    fn do_setup(&mut self) -> Result<()> {
        Ok(())
    }

    fn pre_execute(&mut self) -> Result<()> {
        Ok(())
    }

    /// One unit of work
    fn do_execute(&mut self) -> Result<()>;

    fn post_execute(&mut self) -> Result<()> {
        Ok(())
    }

    fn do_wrap_up(&mut self) {}

    fn do_clean_up(&mut self) {}
}

/// Object-safe cloning for boxed actors
pub trait ActorClone {
    fn clone_box(&self) -> Box<dyn Actor>;
}

impl<T> ActorClone for T
where
    T: Actor + Clone + 'static
{
    fn clone_box(&self) -> Box<dyn Actor> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Actor> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl fmt::Debug for dyn Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("class", &self.class_name())
            .field("full_name", &self.full_name())
            .field("state", &self.state())
            .finish()
    }
}

/// State every actor carries: options, inherited context, stop flag and the
/// token buffers matching its kind
pub struct ActorBase {
    kind:      ActorKind,
    options:   OptionManager,
    context:   ActorContext,
    stopped:   StopSignal,
    state:     ActorState,
    full_name: Option<String>,
    input:     Option<Token>,
    outputs:   VecDeque<Token>,
    /// Storage owned by this actor and shared with its descendants
    storage:   Option<Storage>,
    handler:   bool
}

impl Clone for ActorBase {
    fn clone(&self) -> Self {
        Self {
            kind:      self.kind,
            options:   self.options.clone(),
            context:   self.context.clone(),
            stopped:   StopSignal::new(),
            state:     self.state,
            full_name: self.full_name.clone(),
            input:     None,
            outputs:   VecDeque::new(),
            storage:   self.storage.as_ref().map(|_| Storage::new()),
            handler:   self.handler
        }
    }
}

impl ActorBase {
    /// Base with the options every actor has
    pub fn new(kind: ActorKind) -> Self {
        let mut options = OptionManager::new();
        let common = [
            OptionSpec::new(NAME_OPTION, ValueType::Str, "", "The name of the actor, defaults to the type name"),
            OptionSpec::new(DEBUG_OPTION, ValueType::Bool, false, "Whether to log the lifecycle steps at info level"),
            OptionSpec::new(
                STOP_ON_ERROR_OPTION,
                ValueType::Bool,
                true,
                "Whether a failure of this actor aborts the enclosing director's pass"
            )
        ];
        for spec in common {
            options.declare_builtin(spec);
        }

        Self {
            kind,
            options,
            context: ActorContext::default(),
            stopped: StopSignal::new(),
            state: ActorState::Initialized,
            full_name: None,
            input: None,
            outputs: VecDeque::new(),
            storage: None,
            handler: false
        }
    }

    /// Base for actors that manage sub-actors through the `actors` option
    pub fn container(kind: ActorKind) -> Self {
        let mut base = Self::new(kind);
        base.options.declare_builtin(OptionSpec::list_of(ACTORS_OPTION, ValueType::Actor, vec![], "The sub-actors"));
        base.handler = true;
        base
    }

    /// Makes this actor own a storage table for its descendants
    pub fn with_storage(mut self) -> Self {
        self.storage = Some(Storage::new());
        self
    }

    /// Declares an actor-specific option
    pub fn declare(&mut self, spec: OptionSpec) {
        self.options.declare_builtin(spec);
    }

    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    pub fn is_handler(&self) -> bool {
        self.handler
    }

    pub fn options(&self) -> &OptionManager {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut OptionManager {
        &mut self.options
    }

    pub fn context(&self) -> &ActorContext {
        &self.context
    }

    pub fn variables(&self) -> &Variables {
        &self.context.variables
    }

    /// Own storage if this actor has one, else the inherited one
    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref().or(self.context.storage.as_ref())
    }

    /// Handle to this actor's own stop flag
    pub fn stop_signal(&self) -> StopSignal {
        self.stopped.clone()
    }

    /// Stop flag of the root of the tree
    pub fn root_stop(&self) -> StopSignal {
        self.context.ancestor_stops.first().cloned().unwrap_or_else(|| self.stopped.clone())
    }

    /// Own flag plus every ancestor's, for polling inside long-running work
    pub fn stop_check(&self) -> StopCheck {
        let mut signals = self.context.ancestor_stops.clone();
        signals.push(self.stopped.clone());
        StopCheck::new(signals)
    }

    pub fn children(&self) -> Vec<&dyn Actor> {
        if self.handler { self.options.actors(ACTORS_OPTION) } else { Vec::new() }
    }

    pub fn children_mut(&mut self) -> Vec<&mut dyn Actor> {
        if self.handler { self.options.actors_mut(ACTORS_OPTION) } else { Vec::new() }
    }

    pub fn input(&self) -> Option<&Token> {
        self.input.as_ref()
    }

    pub fn take_input(&mut self) -> Option<Token> {
        self.input.take()
    }

    pub fn push_output(&mut self, token: Token) {
        self.outputs.push_back(token);
    }

    /// Logs a user-facing message on behalf of the actor
    pub fn log(&self, message: &str) {
        event!(
            Level::INFO,
            event = actor::MESSAGE,
            actor = %self.full_name.as_deref().unwrap_or_default(),
            message
        );
    }
}

/// Lifecycle operations shared by every actor
pub trait Lifecycle: Actor {
    /// Configured name, or the type name when none is set
    fn name(&self) -> String {
        match self.base().options.get_str(NAME_OPTION) {
            Ok(name) if !name.is_empty() => name,
            _ => short_class_name(self.class_name()).to_string()
        }
    }

    /// Dot-joined path from the root
    fn full_name(&self) -> String {
        if let Some(full_name) = &self.base().full_name {
            return full_name.clone();
        }
        match &self.base().context.parent_full_name {
            Some(parent) => format!("{}.{}", parent, self.name()),
            None => self.name()
        }
    }

    fn is_root(&self) -> bool {
        self.base().context.is_root()
    }

    fn kind(&self) -> ActorKind {
        self.base().kind
    }

    fn state(&self) -> ActorState {
        self.base().state
    }

    fn is_debug(&self) -> bool {
        self.base().options.get_bool(DEBUG_OPTION).unwrap_or(false)
    }

    fn stop_on_error(&self) -> bool {
        self.base().options.get_bool(STOP_ON_ERROR_OPTION).unwrap_or(true)
    }

    /// True once this actor or any ancestor was asked to stop
    fn is_stopped(&self) -> bool {
        self.base().stop_check().is_set()
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.base().options.get(name)
    }

    /// Sets an option (or attaches a variable) and re-applies the context
    fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<bool> {
        self.set_value(name, value.into())
    }

    fn set_value(&mut self, name: &str, value: Value) -> Result<bool> {
        let changed = self.base_mut().options.set(name, value)?;
        if changed {
            if name == ACTORS_OPTION {
                make_names_unique(&mut self.base_mut().children_mut());
            }
            self.base_mut().state = ActorState::Configuring;
            self.refresh();
        }
        Ok(changed)
    }

    /// Builder-style `set` for assembling flows in code
    fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self>
    where
        Self: Sized
    {
        self.set_value(name, value.into())?;
        Ok(self)
    }

    /// Replaces the inherited context and re-applies it down the tree
    fn attach(&mut self, context: ActorContext) {
        self.base_mut().context = context;
        self.refresh();
    }

    /// Recomputes cached names, binds options and conditions to the current
    /// variables and pushes the context into the sub-actors
    fn refresh(&mut self) {
        let base = self.base_mut();
        base.full_name = None;
        let full_name = self.full_name();

        let base = self.base_mut();
        base.full_name = Some(full_name.clone());
        let variables = base.context.variables.clone();
        base.options.set_variables(Some(variables.clone()));
        let owner = ConditionOwner { full_name: full_name.clone(), variables };
        for condition in base.options.conditions_mut() {
            condition.set_owner(owner.clone());
        }

        if base.handler {
            let child_context = base.context.for_children(&full_name, &base.stopped, base.storage.as_ref());
            for child in base.children_mut() {
                child.attach(child_context.clone());
            }
        }

        self.reset();
    }

    /// Pre-flight validation of this actor and its sub-actors
    fn setup(&mut self) -> Result<()> {
        self.base_mut().stopped.clear();
        self.base_mut().state = ActorState::Configuring;
        self.refresh();

        let debug = self.is_debug();
        actor_event!(debug, event = actor::SETUP_STARTED, actor = %self.full_name());

        let result = self.setup_children().and_then(|_| self.do_setup());
        match &result {
            Ok(()) => self.base_mut().state = ActorState::Ready,
            Err(e) => event!(Level::ERROR, event = actor::SETUP_FAILED, actor = %self.full_name(), error = %e)
        }
        result
    }

    #[doc(hidden)]
    fn setup_children(&mut self) -> Result<()> {
        if !self.base().handler {
            return Ok(());
        }
        let mut seen = HashSet::new();
        for child in self.base().children() {
            let name = child.name();
            if !seen.insert(name.clone()) {
                return Err(FlowError::Structural(format!("Duplicate actor name: {}", name)));
            }
        }
        for child in self.base_mut().children_mut() {
            child.setup()?;
        }
        Ok(())
    }

    /// Runs `pre_execute → do_execute → post_execute`; failures and panics come
    /// back as errors and never unwind into the caller
    fn execute(&mut self) -> Result<()> {
        let debug = self.is_debug();
        actor_event!(debug, event = actor::EXECUTE_STARTED, actor = %self.full_name());

        let kind = self.kind();
        self.base_mut().state = ActorState::Running;
        if kind.generates_output() {
            self.base_mut().outputs.clear();
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.pre_execute()?;
            self.do_execute()?;
            self.post_execute()
        }));

        if kind.accepts_input() {
            self.base_mut().input = None;
        }

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                event!(Level::ERROR, event = actor::EXECUTE_PANICKED, actor = %self.full_name(), panic = %message);
                Err(FlowError::Execution(format!("Panicked: {}", message)))
            }
        };

        self.base_mut().state = if self.is_stopped() { ActorState::Stopped } else { ActorState::Finished };
        match &result {
            Ok(()) => actor_event!(debug, event = actor::EXECUTE_FINISHED, actor = %self.full_name()),
            Err(e) => event!(Level::WARN, event = actor::EXECUTE_FAILED, actor = %self.full_name(), error = %e)
        }
        result
    }

    /// Hands a token to a consuming actor
    fn input(&mut self, token: Token) -> Result<()> {
        if !self.kind().accepts_input() {
            return Err(FlowError::Structural(format!("Actor does not accept input: {}", self.full_name())));
        }
        self.base_mut().input = Some(token);
        Ok(())
    }

    fn has_output(&self) -> bool {
        !self.base().outputs.is_empty()
    }

    /// Next buffered output token, oldest first
    fn output(&mut self) -> Option<Token> {
        self.base_mut().outputs.pop_front()
    }

    /// Cooperative cancellation of this actor and everything below it
    fn stop_execution(&mut self) {
        event!(Level::DEBUG, event = actor::STOP_REQUESTED, actor = %self.full_name());
        let base = self.base_mut();
        base.stopped.set();
        base.state = ActorState::Stopped;
        for child in base.children_mut() {
            child.stop_execution();
        }
    }

    /// Releases buffered tokens
    fn wrap_up(&mut self) {
        let base = self.base_mut();
        base.input = None;
        base.outputs.clear();
        for child in base.children_mut() {
            child.wrap_up();
        }
        self.do_wrap_up();
        event!(Level::TRACE, event = actor::WRAPPED_UP, actor = %self.full_name());
    }

    /// Releases any remaining resources
    fn clean_up(&mut self) {
        for child in self.base_mut().children_mut() {
            child.clean_up();
        }
        self.do_clean_up();
        self.base_mut().state = ActorState::TornDown;
        event!(Level::TRACE, event = actor::CLEANED_UP, actor = %self.full_name());
    }

    /// The serialized `{class, options}` record
    fn to_dict(&self, skip_default: bool) -> Result<JsonValue> {
        actor_to_dict(self, skip_default)
    }

    /// Plain-text help page: type, description and options
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

impl<A> Lifecycle for A where A: Actor + ?Sized {}

/// `sources.ForLoop` → `ForLoop`
pub fn short_class_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}

/// Renames later siblings that share a name with an earlier one (`Name-2`, ...)
pub fn make_names_unique(actors: &mut [&mut dyn Actor]) {
    let mut taken: HashSet<String> = HashSet::new();
    for actor in actors.iter_mut() {
        let name = actor.name();
        if taken.insert(name.clone()) {
            continue;
        }
        let mut suffix = 2;
        let unique = loop {
            let candidate = format!("{}-{}", name, suffix);
            if !taken.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        if actor.base_mut().options.set(NAME_OPTION, unique.as_str()).is_ok() {
            taken.insert(unique);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapter::stub::{Collect, Emit, Fail, Panic};

    #[test]
    fn test_name_defaults_to_type_name() {
        let actor = Emit::new(vec![]);
        assert_eq!(actor.name(), "Emit");
        assert!(actor.is_root());
        assert_eq!(actor.full_name(), "Emit");

        let actor = Emit::new(vec![]).with(NAME_OPTION, "numbers").unwrap();
        assert_eq!(actor.full_name(), "numbers");
    }

    #[test]
    fn test_execute_buffers_outputs_in_order() {
        let mut actor = Emit::new(vec![json!(1), json!(2)]);
        actor.setup().unwrap();
        actor.execute().unwrap();
        assert_eq!(actor.state(), ActorState::Finished);
        assert_eq!(actor.output(), Some(json!(1)));
        assert!(actor.has_output());
        assert_eq!(actor.output(), Some(json!(2)));
        assert!(!actor.has_output());
    }

    #[test]
    fn test_errors_are_returned_not_raised() {
        let mut actor = Fail::new("boom");
        actor.input(json!(1)).unwrap();
        let err = actor.execute().unwrap_err();
        assert_eq!(err, FlowError::Execution("boom".to_string()));
        assert!(actor.base().input().is_none());
    }

    #[test]
    fn test_panics_are_caught_at_the_boundary() {
        let mut actor = Panic::new();
        let err = actor.execute().unwrap_err();
        assert!(matches!(err, FlowError::Execution(msg) if msg.contains("deliberate")));
    }

    #[test]
    fn test_input_requires_a_consumer() {
        let mut actor = Emit::new(vec![]);
        assert!(matches!(actor.input(json!(1)), Err(FlowError::Structural(_))));
        let (mut sink, _) = Collect::new();
        assert!(sink.input(json!(1)).is_ok());
    }

    #[test]
    fn test_stop_is_sticky_until_setup() {
        let mut actor = Emit::new(vec![]);
        actor.stop_execution();
        assert!(actor.is_stopped());
        assert_eq!(actor.state(), ActorState::Stopped);
        actor.setup().unwrap();
        assert!(!actor.is_stopped());
    }

    #[test]
    fn test_unique_sibling_names() {
        let mut a: Box<dyn Actor> = Box::new(Emit::new(vec![]));
        let mut b: Box<dyn Actor> = Box::new(Emit::new(vec![]));
        let mut c: Box<dyn Actor> = Box::new(Emit::new(vec![]));
        let mut actors: Vec<&mut dyn Actor> = vec![a.as_mut() as &mut dyn Actor, b.as_mut(), c.as_mut()];
        make_names_unique(&mut actors);
        let names: Vec<String> = actors.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["Emit", "Emit-2", "Emit-3"]);
    }

    #[test]
    fn test_help_page() {
        let help = Emit::new(vec![]).to_help();
        assert!(help.starts_with("stub.Emit\n=========\n"));
        assert!(help.contains("stop_on_error/bool: true"));
    }

    #[test]
    fn test_clone_gets_fresh_stop_flag() {
        let mut original = Emit::new(vec![]);
        let copy: Box<dyn Actor> = original.clone_box();
        original.stop_execution();
        assert!(!copy.is_stopped());
    }
}
