//! Sinks: actors that only consume tokens

use crate::{
    domain::{
        error::Result,
        option::OptionSpec,
        state::ActorKind,
        value::{Token, ValueType, token_to_string}
    },
    port::actor::{Actor, ActorBase}
};

/// Swallows every token
#[derive(Clone)]
pub struct Null {
    base: ActorBase
}

impl Null {
    pub fn new() -> Self {
        Self { base: ActorBase::new(ActorKind::Sink) }
    }
}

impl Default for Null {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for Null {
    fn class_name(&self) -> &'static str {
        "sinks.Null"
    }

    fn description(&self) -> &'static str {
        "Simply swallows the data."
    }

    actor_base!();

    fn do_execute(&mut self) -> Result<()> {
        self.base.take_input();
        Ok(())
    }
}

/// Prints every token to stdout
#[derive(Clone)]
pub struct ConsoleOutput {
    base: ActorBase
}

impl ConsoleOutput {
    pub fn new() -> Self {
        let mut base = ActorBase::new(ActorKind::Sink);
        base.declare(OptionSpec::new("prefix", ValueType::Str, "", "The prefix to prepend to the output"));
        Self { base }
    }

    /// The line printed for a token
    pub fn format(&self, token: &Token) -> Result<String> {
        let prefix = self.base.options().get_str("prefix")?;
        Ok(format!("{}{}", self.base.variables().expand(&prefix), token_to_string(token)))
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for ConsoleOutput {
    fn class_name(&self) -> &'static str {
        "sinks.ConsoleOutput"
    }

    fn description(&self) -> &'static str {
        "Simply outputs the string representation of the incoming data to stdout."
    }

    actor_base!();

    fn do_execute(&mut self) -> Result<()> {
        if let Some(token) = self.base.take_input() {
            println!("{}", self.format(&token)?);
        }
        Ok(())
    }
}
