//! Observable application state.

pub mod session;
