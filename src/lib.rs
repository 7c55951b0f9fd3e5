//! TetrECS (workspace facade crate).
//!
//! Re-exports the workspace crates under one roof so hosts and integration
//! tests can depend on `tetrecs::{core, engine, adapter, types}` while the
//! implementation lives in dedicated crates under `crates/`.

pub use tetrecs_adapter as adapter;
pub use tetrecs_core as core;
pub use tetrecs_engine as engine;
pub use tetrecs_types as types;
