use crate::{
    domain::{context::StopCheck, error::Result, state::ActorKind, value::Token},
    port::actor::Actor
};

/// Scheduler that drives a list of sibling actors for their container
///
/// A director holds no per-run state: the owner lends it the live child list
/// for the duration of one `execute` call, together with the stop flags to
/// poll between steps.
pub trait Director: Send {
    /// Structural validation of the actor list, addressed by position
    fn check(&self, kinds: &[ActorKind]) -> Result<()>;

    /// One full pass over the actors. `input` is handed to the first actor
    /// when the owner feeds a token into its sub-flow.
    fn execute(&self, actors: &mut [&mut dyn Actor], input: Option<Token>, stop: &StopCheck) -> Result<()>;
}
