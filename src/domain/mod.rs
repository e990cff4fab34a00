//! Core types of the flow engine: values, options, variables, storage and the
//! lifecycle vocabulary shared by actors and directors.

pub mod constant;
pub mod context;
pub mod error;
pub mod option;
pub mod state;
pub mod storage;
pub mod value;
pub mod variable;
