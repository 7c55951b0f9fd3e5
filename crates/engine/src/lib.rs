//! Engine runtime - runs a game on its own tokio task
//!
//! The core [`Engine`](tetrecs_core::Engine) is synchronous and never sleeps.
//! This crate gives it a single owner: a [`GameSession`] task that receives
//! commands over a channel and drives the countdown with one tokio timer.
//! Timer expiry and player commands are handled one at a time on that task, so
//! a placement and a timeout can never interleave.
//!
//! # Example
//!
//! ```no_run
//! use tetrecs_core::Engine;
//! use tetrecs_engine::GameSession;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let (handle, mut events) = GameSession::spawn_with_events(Engine::seeded(5, 5, 42));
//! handle.start().await?;
//! handle.place(2, 2).await?;
//! while let Some(event) = events.recv().await {
//!     println!("{}", event.name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod session;

pub use tetrecs_core as core;
pub use tetrecs_types as types;

pub use session::{EventStream, GameHandle, GameSession, SessionCommand, COMMAND_CAPACITY};
