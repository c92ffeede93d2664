//! # tape-vm
//!
//! A minimal virtual machine for the eight-opcode tape language: move the
//! data pointer, change the current cell, read and write bytes, and loop
//! with brackets.
//!
//! ```
//! use tapevm::{run_buffered, Program};
//!
//! let program = Program::from(",+.");
//! let (output, _) = run_buffered(&program, b"a").unwrap();
//! assert_eq!(output, b"b");
//! ```

pub mod vm;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use vm::{
    run_buffered, CancelToken, LoadError, Machine, MachineState, Opcode, Program, RunOutcome,
    RunReport, Tape, TapeError, VmError, TAPE_SIZE,
};
