//! Domain Events - Structured events for internal monitoring and debugging

/// Actor lifecycle events
pub mod actor {
    pub const SETUP_STARTED: &str = "actor.setup_started";
    pub const SETUP_FAILED: &str = "actor.setup_failed";
    pub const EXECUTE_STARTED: &str = "actor.execute_started";
    pub const EXECUTE_FINISHED: &str = "actor.execute_finished";
    pub const EXECUTE_FAILED: &str = "actor.execute_failed";
    pub const EXECUTE_PANICKED: &str = "actor.execute_panicked";
    pub const STOP_REQUESTED: &str = "actor.stop_requested";
    pub const WRAPPED_UP: &str = "actor.wrapped_up";
    pub const CLEANED_UP: &str = "actor.cleaned_up";
    pub const MESSAGE: &str = "actor.message";
}

/// Director scheduling events
pub mod director {
    pub const CHECK_FAILED: &str = "director.check_failed";
    pub const PASS_STARTED: &str = "director.pass_started";
    pub const PASS_FINISHED: &str = "director.pass_finished";
    pub const PASS_STOPPED: &str = "director.pass_stopped";
    pub const STANDALONE_EXECUTED: &str = "director.standalone_executed";
    pub const ACTOR_FAILED: &str = "director.actor_failed";
    pub const TOKEN_DROPPED: &str = "director.token_dropped";
    pub const BRANCH_EXECUTED: &str = "director.branch_executed";
}

/// Option manager events
pub mod option {
    pub const UNKNOWN_OPTION: &str = "option.unknown";
    pub const DECLARE_REJECTED: &str = "option.declare_rejected";
    pub const VARIABLE_ATTACHED: &str = "option.variable_attached";
    pub const VARIABLE_UNRESOLVED: &str = "option.variable_unresolved";
    pub const CONVERSION_FAILED: &str = "option.conversion_failed";
}

/// Storage table events
pub mod storage {
    pub const ITEM_ADDED: &str = "storage.item_added";
    pub const ITEM_UPDATED: &str = "storage.item_updated";
    pub const ITEM_DELETED: &str = "storage.item_deleted";
    pub const CLEARED: &str = "storage.cleared";
}

/// Flow runner events
pub mod flow {
    pub const FLOW_LOADED: &str = "flow.loaded";
    pub const FLOW_SAVED: &str = "flow.saved";
    pub const FLOW_STARTED: &str = "flow.started";
    pub const FLOW_FINISHED: &str = "flow.finished";
    pub const FLOW_FAILED: &str = "flow.failed";
    pub const INTERRUPTED: &str = "flow.interrupted";
}

/// Class registry events
pub mod registry {
    pub const CLASS_REGISTERED: &str = "registry.class_registered";
    pub const CLASS_REPLACED: &str = "registry.class_replaced";
}
