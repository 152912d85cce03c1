//! Lifecycle of pluggable feature modules.
//!
//! A module is registered once with its [`ModuleOptions`]. Enabled modules
//! have their listeners attached to the dispatcher; disabled ones are only
//! recorded so they still show up in [`ModuleRegistry::status`].

pub mod error;
pub mod module;
pub mod registry;

pub use {
    error::{Error, Result},
    module::{Module, ModuleOptions, ModuleStatus},
    registry::{ModuleRecord, ModuleRegistry},
};
