//! Scripted actors for exercising directors and control actors in tests

use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::{
    domain::{
        context::StopSignal,
        error::{FlowError, Result},
        state::ActorKind,
        value::Token
    },
    port::actor::{Actor, ActorBase}
};

/// Shared record of what the stubs saw, in order
pub type Trace = Arc<Mutex<Vec<Token>>>;

pub fn trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn seen(trace: &Trace) -> Vec<Token> {
    trace.lock().map(|t| t.clone()).unwrap_or_default()
}

fn record(trace: &Trace, token: Token) {
    if let Ok(mut t) = trace.lock() {
        t.push(token);
    }
}

macro_rules! stub_actor {
    ($name:ident, $desc:literal) => {
        impl $name {
            fn class() -> &'static str {
                concat!("stub.", stringify!($name))
            }
        }

        impl Actor for $name {
            fn class_name(&self) -> &'static str {
                Self::class()
            }

            fn description(&self) -> &'static str {
                $desc
            }

            fn base(&self) -> &ActorBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut ActorBase {
                &mut self.base
            }

            fn do_execute(&mut self) -> Result<()> {
                self.run()
            }
        }
    };
}

/// Source emitting a fixed list of tokens per execution
#[derive(Clone)]
pub struct Emit {
    base:   ActorBase,
    tokens: Vec<Token>
}

impl Emit {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { base: ActorBase::new(ActorKind::Source), tokens }
    }

    fn run(&mut self) -> Result<()> {
        for token in self.tokens.clone() {
            self.base.push_output(token);
        }
        Ok(())
    }
}

stub_actor!(Emit, "Emits a fixed list of tokens.");

/// Transformer emitting every input `times` times as `[token, copy]`
#[derive(Clone)]
pub struct Repeat {
    base:  ActorBase,
    times: usize
}

impl Repeat {
    pub fn new(times: usize) -> Self {
        Self { base: ActorBase::new(ActorKind::Transformer), times }
    }

    fn run(&mut self) -> Result<()> {
        if let Some(token) = self.base.take_input() {
            for copy in 0..self.times {
                self.base.push_output(json!([token, copy]));
            }
        }
        Ok(())
    }
}

stub_actor!(Repeat, "Repeats every input token.");

/// Transformer failing on one specific token and forwarding all others
#[derive(Clone)]
pub struct FailOn {
    base:    ActorBase,
    trigger: Token
}

impl FailOn {
    pub fn new(trigger: Token) -> Self {
        Self { base: ActorBase::new(ActorKind::Transformer), trigger }
    }

    fn run(&mut self) -> Result<()> {
        match self.base.take_input() {
            Some(token) if token == self.trigger => Err(FlowError::Execution(format!("refusing {}", token))),
            Some(token) => {
                self.base.push_output(token);
                Ok(())
            }
            None => Ok(())
        }
    }
}

stub_actor!(FailOn, "Fails on one token.");

/// Transformer that always fails
#[derive(Clone)]
pub struct Fail {
    base:    ActorBase,
    message: String
}

impl Fail {
    pub fn new(message: &str) -> Self {
        Self { base: ActorBase::new(ActorKind::Transformer), message: message.to_string() }
    }

    fn run(&mut self) -> Result<()> {
        Err(FlowError::Execution(self.message.clone()))
    }
}

stub_actor!(Fail, "Always fails.");

/// Standalone that panics
#[derive(Clone)]
pub struct Panic {
    base: ActorBase
}

impl Panic {
    pub fn new() -> Self {
        Self { base: ActorBase::new(ActorKind::Standalone) }
    }

    fn run(&mut self) -> Result<()> {
        panic!("deliberate failure")
    }
}

stub_actor!(Panic, "Panics.");

/// Sink recording every token it receives
#[derive(Clone)]
pub struct Collect {
    base:  ActorBase,
    trace: Trace
}

impl Collect {
    pub fn new() -> (Self, Trace) {
        let trace = trace();
        (Self::into_trace(&trace), trace)
    }

    pub fn into_trace(trace: &Trace) -> Self {
        Self { base: ActorBase::new(ActorKind::Sink), trace: Arc::clone(trace) }
    }

    fn run(&mut self) -> Result<()> {
        if let Some(token) = self.base.take_input() {
            record(&self.trace, token);
        }
        Ok(())
    }
}

stub_actor!(Collect, "Records the tokens it receives.");

/// Standalone writing its label into a trace whenever it runs
#[derive(Clone)]
pub struct Touch {
    base:  ActorBase,
    label: String,
    trace: Trace
}

impl Touch {
    pub fn new(label: &str, trace: &Trace) -> Self {
        Self { base: ActorBase::new(ActorKind::Standalone), label: label.to_string(), trace: Arc::clone(trace) }
    }

    fn run(&mut self) -> Result<()> {
        record(&self.trace, json!(self.label));
        Ok(())
    }
}

stub_actor!(Touch, "Records that it ran.");

/// Transformer forwarding tokens that raises a stop signal on its n-th run,
/// standing in for a stop request from outside the flow
#[derive(Clone)]
pub struct TripAfter {
    base:   ActorBase,
    runs:   usize,
    after:  usize,
    signal: StopSignal
}

impl TripAfter {
    pub fn new(after: usize, signal: StopSignal) -> Self {
        Self { base: ActorBase::new(ActorKind::Transformer), runs: 0, after, signal }
    }

    fn run(&mut self) -> Result<()> {
        self.runs += 1;
        if self.runs == self.after {
            self.signal.set();
        }
        if let Some(token) = self.base.take_input() {
            self.base.push_output(token);
        }
        Ok(())
    }
}

stub_actor!(TripAfter, "Raises a stop signal after a number of runs.");
