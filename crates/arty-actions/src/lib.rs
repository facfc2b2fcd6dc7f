//! # arty-actions
//!
//! The plugin's actions and the orchestrator that runs one of them:
//! - `copy`, `delete`, `set-prop`, `upload`, `docker-promote` executors
//! - `Retrier`, the single retry runner every remote call goes through
//! - `Prop` and the `name=value;name2=v1,v2` property wire form
//! - `Plugin`, the validate-then-exec state machine

pub mod actions;
pub mod error;
pub mod plugin;
pub mod prop;
pub mod retry;

pub use actions::{
    ActionKind, Actions, CopyAction, DeleteAction, DockerPromoteAction, SetPropAction,
    UploadAction,
};
pub use error::{PluginError, Result};
pub use plugin::{Plugin, PluginState};
pub use prop::{parse_props, render_props, Prop};
pub use retry::Retrier;
