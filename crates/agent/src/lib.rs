//! The memory-augmented orchestration loop for Wayfarer.
//!
//! One turn: recall traveler insights, assemble the context window, loop
//! model calls and tool executions until a final answer, persist the
//! exchange atomically, and hand the turn summary to the background memory
//! writer. Observers follow along on the session's ordered event stream.

pub mod assembler;
pub mod loop_runner;
pub mod session;

pub use assembler::ContextAssembler;
pub use loop_runner::{AgentLoop, TURN_FAILED_APOLOGY};
pub use session::{Session, SessionManager};
