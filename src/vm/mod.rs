//! The tape machine.
//!
//! - a 30000-cell byte tape with a bounds-checked data pointer
//! - an immutable program of raw bytes, eight of which are opcodes
//! - an engine that resolves loops by scanning for the matching bracket

pub mod cancel;
pub mod execute;
pub mod opcode;
pub mod program;
pub mod tape;

pub use cancel::CancelToken;
pub use execute::{run_buffered, Machine, MachineState, RunOutcome, RunReport, VmError};
pub use opcode::Opcode;
pub use program::{LoadError, Program};
pub use tape::{Tape, TapeError, TAPE_SIZE};
