//! Agent loop primitives (turns, events, approvals).

pub mod approvals;
pub mod events;
pub mod pending;
pub mod runner;
pub mod session;
pub mod types;

pub use approvals::*;
pub use events::*;
pub use pending::PendingWork;
pub use runner::*;
pub use session::ChatSession;
pub use types::*;
