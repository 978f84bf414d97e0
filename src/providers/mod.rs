//! Provider implementations

pub mod scripted;

pub use scripted::{ScriptedHandle, ScriptedProvider};
