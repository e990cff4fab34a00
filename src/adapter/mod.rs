//! Concrete actors, conditions, directors and the persistence layer

/// Implements the `base`/`base_mut` accessors of [`crate::port::actor::Actor`]
/// for a struct with a `base: ActorBase` field
macro_rules! actor_base {
    () => {
        fn base(&self) -> &$crate::port::actor::ActorBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut $crate::port::actor::ActorBase {
            &mut self.base
        }
    };
}

pub mod condition;
pub mod control;
pub mod director;
pub mod persist;
pub mod registry;
pub mod sink;
pub mod source;
pub mod standalone;
#[cfg(test)]
pub mod stub;
pub mod transformer;

use crate::domain::{
    error::{FlowError, Result},
    storage::Storage,
    variable::is_valid_name
};

pub const VAR_NAME_OPTION: &str = "var_name";
pub const VAR_VALUE_OPTION: &str = "var_value";
pub const STORAGE_NAME_OPTION: &str = "storage_name";

/// Setup check shared by the actors addressing a variable
pub(crate) fn check_variable_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FlowError::Configuration("No variable name provided!".to_string()));
    }
    if !is_valid_name(name) {
        return Err(FlowError::invalid_variable_name(name));
    }
    Ok(())
}

pub(crate) fn check_storage_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FlowError::Configuration("No storage name provided!".to_string()));
    }
    if !is_valid_name(name) {
        return Err(FlowError::invalid_storage_name(name));
    }
    Ok(())
}

/// The storage an actor inherited, or a setup error when it runs outside a flow
pub(crate) fn require_storage(storage: Option<&Storage>) -> Result<&Storage> {
    storage.ok_or_else(|| FlowError::Configuration("No storage handler available!".to_string()))
}
