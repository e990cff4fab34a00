//! Directors: the schedulers behind every container actor
//!
//! [`SequentialDirector`] chains its actors, passing each token left to right
//! and draining buffered output depth-first before pulling from earlier actors
//! again. [`BranchDirector`] feeds the same token to every actor in turn.

use tracing::{Level, event};

use crate::{
    domain::{
        constant::director,
        context::StopCheck,
        error::{FlowError, Result},
        state::ActorKind,
        value::Token
    },
    port::{
        actor::{Actor, Lifecycle},
        director::Director
    }
};

/// Token-passing scheduler for a list of chained actors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequentialDirector {
    pub allows_standalones: bool,
    pub requires_source:    bool,
    pub requires_sink:      bool
}

impl SequentialDirector {
    pub const fn new(allows_standalones: bool, requires_source: bool, requires_sink: bool) -> Self {
        Self { allows_standalones, requires_source, requires_sink }
    }
}

impl Director for SequentialDirector {
    fn check(&self, kinds: &[ActorKind]) -> Result<()> {
        if kinds.is_empty() {
            return Err(FlowError::Structural("No actors to execute!".to_string()));
        }

        if !self.allows_standalones
            && let Some(index) = kinds.iter().position(ActorKind::is_standalone)
        {
            return Err(FlowError::Structural(format!("Actor #{} is a standalone, which is not allowed!", index + 1)));
        }

        // positions taking part in the token chain
        let chain: Vec<usize> = (0..kinds.len()).filter(|&i| !kinds[i].is_standalone()).collect();

        if self.requires_source
            && let Some(&first) = chain.first()
            && kinds[first] != ActorKind::Source
        {
            return Err(FlowError::Structural("First actor must be a source!".to_string()));
        }

        if self.requires_sink && !chain.last().is_some_and(|&last| kinds[last] == ActorKind::Sink) {
            return Err(FlowError::Structural("Last actor must be a sink!".to_string()));
        }

        for pair in chain.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            if !kinds[current].generates_output() {
                return Err(FlowError::Structural(format!("Actor #{} does not generate output!", current + 1)));
            }
            if !kinds[next].accepts_input() {
                return Err(FlowError::Structural(format!("Actor #{} does not accept input!", next + 1)));
            }
        }

        Ok(())
    }

    fn execute(&self, actors: &mut [&mut dyn Actor], input: Option<Token>, stop: &StopCheck) -> Result<()> {
        let kinds: Vec<ActorKind> = actors.iter().map(|a| a.kind()).collect();
        if let Err(e) = self.check(&kinds) {
            event!(Level::ERROR, event = director::CHECK_FAILED, error = %e);
            return Err(e);
        }

        event!(Level::TRACE, event = director::PASS_STARTED, actors = actors.len());
        let result = Pass::new(actors, &kinds, stop).run(input);
        event!(Level::TRACE, event = director::PASS_FINISHED, ok = result.is_ok());
        result
    }
}

/// State of a single pass of the sequential director
struct Pass<'p, 'a> {
    actors:      &'p mut [&'a mut dyn Actor],
    /// Positions of the non-standalone actors
    chain:       Vec<usize>,
    /// Standalones still to run in this pass
    standalones: Vec<bool>,
    stop:        &'p StopCheck,
    first_error: Option<FlowError>
}

impl<'p, 'a> Pass<'p, 'a> {
    fn new(actors: &'p mut [&'a mut dyn Actor], kinds: &[ActorKind], stop: &'p StopCheck) -> Self {
        Self {
            chain: (0..kinds.len()).filter(|&i| !kinds[i].is_standalone()).collect(),
            standalones: kinds.iter().map(ActorKind::is_standalone).collect(),
            actors,
            stop,
            first_error: None
        }
    }

    fn run(mut self, input: Option<Token>) -> Result<()> {
        let first_chained = self.chain.first().copied().unwrap_or(self.actors.len());
        self.run_standalones_before(first_chained)?;

        // producers still holding buffered output, as positions in the chain
        let mut pending: Vec<usize> = Vec::new();
        let mut input = input;
        let mut pulled_head = self.chain.is_empty();

        loop {
            if self.stop.is_set() {
                event!(Level::DEBUG, event = director::PASS_STOPPED);
                return self.finish();
            }

            let (start, token) = if let Some(position) = pending.pop() {
                let index = self.chain[position];
                let actor = &mut *self.actors[index];
                let token = actor.output();
                if actor.has_output() {
                    pending.push(position);
                }
                (position + 1, token)
            } else if !pulled_head {
                pulled_head = true;
                (0, input.take())
            } else {
                break;
            };

            self.walk(start, token, &mut pending)?;
        }

        if !self.stop.is_set() {
            let end = self.actors.len();
            self.run_standalones_before(end)?;
        }
        self.finish()
    }

    /// Moves one token rightwards from `start` until an actor produces nothing
    fn walk(&mut self, start: usize, mut token: Option<Token>, pending: &mut Vec<usize>) -> Result<()> {
        if start > 0 && token.is_none() {
            return Ok(());
        }

        for position in start..self.chain.len() {
            if self.stop.is_set() {
                return Ok(());
            }
            let index = self.chain[position];
            self.run_standalones_before(index)?;

            let actor = &mut *self.actors[index];
            if let Some(t) = token.take()
                && actor.kind().accepts_input()
            {
                actor.input(t)?;
            }

            if let Err(e) = actor.execute() {
                event!(Level::ERROR, event = director::ACTOR_FAILED, actor = %actor.full_name(), error = %e);
                let error = failure("actor", index, e);
                if actor.stop_on_error() || matches!(error, FlowError::Evaluation(_)) {
                    return Err(error);
                }
                event!(Level::WARN, event = director::TOKEN_DROPPED, actor = %actor.full_name());
                self.first_error.get_or_insert(error);
                return Ok(());
            }

            if !actor.kind().generates_output() || !actor.has_output() {
                return Ok(());
            }
            token = actor.output();
            if actor.has_output() {
                pending.push(position);
            }
        }

        if let Some(t) = token {
            event!(Level::TRACE, event = director::TOKEN_DROPPED, token = %t);
        }
        Ok(())
    }

    /// Runs the standalones left of `limit` that have not run in this pass
    fn run_standalones_before(&mut self, limit: usize) -> Result<()> {
        for index in 0..limit {
            if !self.standalones[index] {
                continue;
            }
            if self.stop.is_set() {
                return Ok(());
            }
            self.standalones[index] = false;

            let actor = &mut *self.actors[index];
            actor
                .execute()
                .map_err(|e| failure("actor", index, e))?;
            event!(Level::TRACE, event = director::STANDALONE_EXECUTED, actor = %actor.full_name());
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self.first_error {
            Some(error) => Err(error),
            None => Ok(())
        }
    }
}

/// Position-addressed failure; a broken condition stays an evaluation error
/// so enclosing directors abort too
fn failure(what: &str, index: usize, error: FlowError) -> FlowError {
    let message = format!("Failed to execute {} #{}: {}", what, index + 1, error);
    match error {
        FlowError::Evaluation(_) => FlowError::Evaluation(message),
        _ => FlowError::Execution(message)
    }
}

/// Runs every actor with the same input, one after the other
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchDirector;

impl Director for BranchDirector {
    fn check(&self, kinds: &[ActorKind]) -> Result<()> {
        if kinds.is_empty() {
            return Err(FlowError::Structural("No actors to execute!".to_string()));
        }
        match kinds.iter().position(|k| !k.accepts_input()) {
            Some(index) => Err(FlowError::Structural(format!("Branch #{} does not accept input!", index + 1))),
            None => Ok(())
        }
    }

    fn execute(&self, actors: &mut [&mut dyn Actor], input: Option<Token>, stop: &StopCheck) -> Result<()> {
        let kinds: Vec<ActorKind> = actors.iter().map(|a| a.kind()).collect();
        self.check(&kinds)?;

        for (index, actor) in actors.iter_mut().enumerate() {
            if stop.is_set() {
                event!(Level::DEBUG, event = director::PASS_STOPPED);
                break;
            }
            if let Some(token) = &input {
                actor.input(token.clone())?;
            }
            actor
                .execute()
                .map_err(|e| failure("branch", index, e))?;
            event!(Level::TRACE, event = director::BRANCH_EXECUTED, branch = index + 1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        adapter::stub::{Collect, Emit, Fail, FailOn, Repeat, Touch, seen, trace},
        domain::context::StopSignal,
        port::actor::STOP_ON_ERROR_OPTION
    };

    const SOURCE_FIRST: SequentialDirector = SequentialDirector::new(true, true, false);

    fn run(director: &SequentialDirector, actors: &mut [Box<dyn Actor>]) -> Result<()> {
        let mut refs: Vec<&mut dyn Actor> = actors.iter_mut().map(|a| a.as_mut() as &mut dyn Actor).collect();
        director.execute(&mut refs, None, &StopCheck::default())
    }

    #[test]
    fn test_check_requires_source() {
        use ActorKind::*;
        let err = SOURCE_FIRST.check(&[Transformer, Sink]).unwrap_err();
        assert_eq!(err, FlowError::Structural("First actor must be a source!".to_string()));
        assert!(SOURCE_FIRST.check(&[Source, Sink]).is_ok());
    }

    #[test]
    fn test_check_messages_are_positional() {
        use ActorKind::*;
        assert_eq!(SOURCE_FIRST.check(&[]).unwrap_err().to_string(), "No actors to execute!");
        assert_eq!(SOURCE_FIRST.check(&[Source, Sink, Sink]).unwrap_err().to_string(), "Actor #2 does not generate output!");
        assert_eq!(SOURCE_FIRST.check(&[Source, Transformer, Source]).unwrap_err().to_string(), "Actor #3 does not accept input!");
        assert_eq!(
            SequentialDirector::new(true, true, true).check(&[Source, Transformer]).unwrap_err().to_string(),
            "Last actor must be a sink!"
        );
        assert_eq!(
            SequentialDirector::new(false, false, false).check(&[Source, Standalone]).unwrap_err().to_string(),
            "Actor #2 is a standalone, which is not allowed!"
        );
    }

    #[test]
    fn test_check_skips_standalones_when_pairing() {
        use ActorKind::*;
        assert!(SOURCE_FIRST.check(&[Standalone, Source, Standalone, Transformer, Sink]).is_ok());
        assert!(SOURCE_FIRST.check(&[Standalone, Standalone]).is_ok());
    }

    #[test]
    fn test_tokens_arrive_in_order() {
        let (sink, received) = Collect::new();
        let mut actors: Vec<Box<dyn Actor>> = vec![
            Box::new(Emit::new(vec![json!(1), json!(2), json!(3)])),
            Box::new(crate::adapter::transformer::PassThrough::new()),
            Box::new(sink),
        ];
        run(&SOURCE_FIRST, &mut actors).unwrap();
        assert_eq!(seen(&received), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_bursts_drain_before_next_pull() {
        let (sink, received) = Collect::new();
        let mut actors: Vec<Box<dyn Actor>> =
            vec![Box::new(Emit::new(vec![json!("a"), json!("b")])), Box::new(Repeat::new(2)), Box::new(sink)];
        run(&SOURCE_FIRST, &mut actors).unwrap();
        assert_eq!(seen(&received), vec![json!(["a", 0]), json!(["a", 1]), json!(["b", 0]), json!(["b", 1])]);
    }

    #[test]
    fn test_standalones_run_in_place() {
        let log = trace();
        let mut actors: Vec<Box<dyn Actor>> = vec![
            Box::new(Touch::new("first", &log)),
            Box::new(Emit::new(vec![json!(1), json!(2)])),
            Box::new(Touch::new("middle", &log)),
            Box::new(Collect::into_trace(&log)),
            Box::new(Touch::new("last", &log)),
        ];
        run(&SOURCE_FIRST, &mut actors).unwrap();
        assert_eq!(seen(&log), vec![json!("first"), json!("middle"), json!(1), json!(2), json!("last")]);
    }

    #[test]
    fn test_failure_aborts_by_default() {
        let (sink, received) = Collect::new();
        let mut actors: Vec<Box<dyn Actor>> =
            vec![Box::new(Emit::new(vec![json!(1), json!(2), json!(3)])), Box::new(FailOn::new(json!(2))), Box::new(sink)];
        let err = run(&SOURCE_FIRST, &mut actors).unwrap_err();
        assert_eq!(err.to_string(), "Failed to execute actor #2: refusing 2");
        assert_eq!(seen(&received), vec![json!(1)]);
    }

    #[test]
    fn test_failure_drops_token_when_stop_on_error_is_off() {
        let (sink, received) = Collect::new();
        let mut lenient = FailOn::new(json!(2));
        lenient.set(STOP_ON_ERROR_OPTION, false).unwrap();
        let mut actors: Vec<Box<dyn Actor>> =
            vec![Box::new(Emit::new(vec![json!(1), json!(2), json!(3)])), Box::new(lenient), Box::new(sink)];
        let err = run(&SOURCE_FIRST, &mut actors).unwrap_err();
        assert_eq!(err.to_string(), "Failed to execute actor #2: refusing 2");
        assert_eq!(seen(&received), vec![json!(1), json!(3)]);
    }

    #[test]
    fn test_structural_error_runs_nothing() {
        let log = trace();
        let mut actors: Vec<Box<dyn Actor>> =
            vec![Box::new(Touch::new("never", &log)), Box::new(Fail::new("x")), Box::new(Collect::into_trace(&log))];
        let err = run(&SOURCE_FIRST, &mut actors).unwrap_err();
        assert!(err.is_structural());
        assert!(seen(&log).is_empty());
    }

    #[test]
    fn test_stop_is_checked_between_steps() {
        let (sink, received) = Collect::new();
        let signal = StopSignal::new();
        let mut actors: Vec<Box<dyn Actor>> = vec![
            Box::new(Emit::new(vec![json!(1), json!(2), json!(3)])),
            Box::new(crate::adapter::stub::TripAfter::new(2, signal.clone())),
            Box::new(sink),
        ];
        let mut refs: Vec<&mut dyn Actor> = actors.iter_mut().map(|a| a.as_mut() as &mut dyn Actor).collect();
        SOURCE_FIRST.execute(&mut refs, None, &StopCheck::new(vec![signal])).unwrap();
        assert_eq!(seen(&received), vec![json!(1)]);
    }

    #[test]
    fn test_initial_token_feeds_first_actor() {
        let (sink, received) = Collect::new();
        let mut actors: Vec<Box<dyn Actor>> = vec![Box::new(Repeat::new(1)), Box::new(sink)];
        let mut refs: Vec<&mut dyn Actor> = actors.iter_mut().map(|a| a.as_mut() as &mut dyn Actor).collect();
        SequentialDirector::new(false, false, false)
            .execute(&mut refs, Some(json!("x")), &StopCheck::default())
            .unwrap();
        assert_eq!(seen(&received), vec![json!(["x", 0])]);
    }

    #[test]
    fn test_branch_feeds_every_child() {
        let log = trace();
        let mut actors: Vec<Box<dyn Actor>> = vec![Box::new(Collect::into_trace(&log)), Box::new(Collect::into_trace(&log))];
        let mut refs: Vec<&mut dyn Actor> = actors.iter_mut().map(|a| a.as_mut() as &mut dyn Actor).collect();
        BranchDirector.execute(&mut refs, Some(json!(7)), &StopCheck::default()).unwrap();
        assert_eq!(seen(&log), vec![json!(7), json!(7)]);
    }

    #[test]
    fn test_branch_stops_on_first_failure() {
        let log = trace();
        let mut actors: Vec<Box<dyn Actor>> = vec![Box::new(Fail::new("nope")), Box::new(Collect::into_trace(&log))];
        let mut refs: Vec<&mut dyn Actor> = actors.iter_mut().map(|a| a.as_mut() as &mut dyn Actor).collect();
        let err = BranchDirector.execute(&mut refs, Some(json!(1)), &StopCheck::default()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to execute branch #1: nope");
        assert!(seen(&log).is_empty());
        assert!(BranchDirector.check(&[ActorKind::Source]).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::adapter::stub::{Collect, Emit, Repeat, seen};

    proptest! {
        #[test]
        fn bursts_terminate_and_keep_per_token_order(
            sources in 0usize..6,
            first in 1usize..4,
            second in 1usize..4
        ) {
            let tokens: Vec<Token> = (0..sources).map(|i| json!(i)).collect();
            let (sink, received) = Collect::new();
            let mut actors: Vec<Box<dyn Actor>> = vec![
                Box::new(Emit::new(tokens.clone())),
                Box::new(Repeat::new(first)),
                Box::new(Repeat::new(second)),
                Box::new(sink),
            ];
            let mut refs: Vec<&mut dyn Actor> = actors.iter_mut().map(|a| a.as_mut() as &mut dyn Actor).collect();
            SequentialDirector::new(true, true, false).execute(&mut refs, None, &StopCheck::default()).unwrap();

            let mut expected = Vec::new();
            for token in &tokens {
                for i in 0..first {
                    for j in 0..second {
                        expected.push(json!([[token, i], j]));
                    }
                }
            }
            prop_assert_eq!(seen(&received), expected);
        }
    }
}
