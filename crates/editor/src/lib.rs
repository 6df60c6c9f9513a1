#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Editor context for the bramble Java workbench.
//!
//! Ties the text layers and the VM bridge together:
//!
//! ```text
//! Context
//! ├── config: BrambleConfig
//! ├── bridge: Arc<DebuggerBridge>        // one VM per context
//! └── invoker: Invoker                   // background calls → UiEvent
//!
//! EditorSession (one per open file)
//! ├── Document
//! ├── SyntaxView                         // node tree + reparse queue
//! ├── LineStyler                         // per-line token styles
//! └── ScopeView                          // scope backgrounds
//! ```
//!
//! Nothing here is global. The UI thread owns its sessions, the
//! [`ObjectBench`] and the [`EventPump`], and drains the pump between frames.

/// Objects the user created in the VM.
pub mod bench;
/// TOML configuration.
pub mod config;
/// The application context.
pub mod context;
/// Background invocations.
pub mod invoke;
/// UI-bound messages and the pump that drains them.
pub mod msg;
/// One open document with its derived views.
pub mod session;

pub use bench::{BenchEntry, BenchError, ObjectBench};
pub use config::{BrambleConfig, ConfigError};
pub use context::Context;
pub use invoke::{Invoker, Target, Ticket};
pub use msg::{EventPump, UiEvent, UiSender};
pub use session::EditorSession;
