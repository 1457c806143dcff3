//! Recording session orchestration
//!
//! This module provides the session layer around the segmentation core:
//! - `SessionController`: the pure, command-emitting state machine that owns
//!   the segment buffer, continuity tracker, and history log
//! - `SessionDriver`: the async loop that wires a recognition backend to the
//!   controller and executes its commands (start/stop/delayed restart)
//! - `SessionConfig`: split interval, restart delay, end markers

mod config;
mod controller;
mod driver;

pub use config::SessionConfig;
pub use controller::{Command, SessionController, SessionPhase};
pub use driver::{SessionDriver, SessionHandle, SessionSnapshot, UserCommand};
