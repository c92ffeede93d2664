//! Execution engine.
//!
//! Implements the fetch-dispatch-advance cycle. Loops are resolved by
//! re-scanning the program for the matching bracket every time a jump is
//! taken; nothing is precomputed, so an unbalanced bracket only fails when
//! execution actually reaches it.

use crate::vm::cancel::CancelToken;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;
use crate::vm::tape::{Tape, TapeError};
use serde::{Serialize, Deserialize};
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Machine execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    /// Instructions remain to be executed.
    Running,
    /// The instruction pointer reached the end of the program.
    Completed,
    /// A cancellation request stopped the run.
    Interrupted,
    /// A fatal error stopped the run.
    Aborted,
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Interrupted,
}

/// Summary of a run that did not abort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Program bytes executed during this run, inert bytes included.
    pub steps: u64,
    pub elapsed: Duration,
}

/// The tape machine.
///
/// Borrows its program for its whole lifetime and owns everything that
/// changes while it runs: the tape, the instruction pointer and the I/O
/// handles.
pub struct Machine<'p, R, W> {
    program: &'p Program,
    tape: Tape,
    ip: usize,
    state: MachineState,
    steps: u64,
    input: R,
    output: W,
    cancel: CancelToken,
}

impl<'p, R: Read, W: Write> Machine<'p, R, W> {
    /// Create a machine positioned at the first instruction with a zeroed tape.
    pub fn new(program: &'p Program, input: R, output: W) -> Self {
        let state = if program.is_empty() {
            MachineState::Completed
        } else {
            MachineState::Running
        };

        Self {
            program,
            tape: Tape::new(),
            ip: 0,
            state,
            steps: 0,
            input,
            output,
            cancel: CancelToken::new(),
        }
    }

    /// Execute a single program byte.
    ///
    /// Returns the opcode that ran, or `None` for an inert byte.
    pub fn step(&mut self) -> Result<Option<Opcode>, VmError> {
        if self.state != MachineState::Running {
            return Err(VmError::NotRunning(self.state));
        }

        // Fetch
        let at = self.ip;
        let Some(byte) = self.program.get(at) else {
            self.state = MachineState::Completed;
            return Ok(None);
        };

        // Advance before dispatch; jumps overwrite it
        self.ip += 1;

        let op = Opcode::decode(byte);
        if let Some(op) = op {
            if let Err(e) = self.execute(op, at) {
                self.state = MachineState::Aborted;
                debug!(ip = at, error = %e, "machine aborted");
                return Err(e);
            }
        }

        self.steps += 1;
        if self.ip >= self.program.len() {
            self.state = MachineState::Completed;
        }

        Ok(op)
    }

    /// Run until the program ends, a fatal error occurs, or `cancel` fires.
    ///
    /// The token is checked before every instruction, and marked while the
    /// machine is blocked on input.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<RunReport, VmError> {
        self.cancel = cancel.clone();
        let start = Instant::now();
        let start_steps = self.steps;

        loop {
            match self.state {
                MachineState::Running => {
                    if cancel.is_cancelled() {
                        self.state = MachineState::Interrupted;
                        continue;
                    }
                    self.step()?;
                }
                MachineState::Completed | MachineState::Interrupted => break,
                MachineState::Aborted => return Err(VmError::NotRunning(self.state)),
            }
        }

        let outcome = match self.state {
            MachineState::Interrupted => RunOutcome::Interrupted,
            _ => RunOutcome::Completed,
        };

        Ok(RunReport {
            outcome,
            steps: self.steps - start_steps,
            elapsed: start.elapsed(),
        })
    }

    fn execute(&mut self, op: Opcode, at: usize) -> Result<(), VmError> {
        match op {
            Opcode::MoveRight => {
                self.tape.move_right().map_err(|e| VmError::out_of_bounds(at, e))?;
            }

            Opcode::MoveLeft => {
                self.tape.move_left().map_err(|e| VmError::out_of_bounds(at, e))?;
            }

            Opcode::Increment => self.tape.increment(),

            Opcode::Decrement => self.tape.decrement(),

            Opcode::Output => {
                let byte = self.tape.current();
                self.output
                    .write_all(&[byte])
                    .and_then(|_| self.output.flush())
                    .map_err(|e| VmError::Output(e.to_string()))?;
            }

            Opcode::Input => {
                // End of input leaves the cell as it was
                if let Some(byte) = self.read_byte() {
                    self.tape.set_current(byte);
                }
            }

            Opcode::LoopOpen => {
                if self.tape.current() == 0 {
                    let close = find_close(self.program.as_bytes(), at)
                        .ok_or(VmError::UnmatchedOpen { ip: at })?;
                    self.ip = close + 1;
                }
            }

            Opcode::LoopClose => {
                if self.tape.current() != 0 {
                    let open = find_open(self.program.as_bytes(), at)
                        .ok_or(VmError::UnmatchedClose { ip: at })?;
                    // The open bracket is fetched again and re-tests the cell
                    self.ip = open;
                }
            }
        }

        Ok(())
    }

    fn read_byte(&mut self) -> Option<u8> {
        let _read = self.cancel.reading_input();
        // A stop requested before the mark was set is not seen by the watcher
        if self.cancel.is_cancelled() {
            return None;
        }

        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return None,
                Ok(_) => return Some(buf[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "input read failed, treating as end of input");
                    return None;
                }
            }
        }
    }
}

impl<'p, R, W> Machine<'p, R, W> {
    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Index of the next byte to fetch.
    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    /// Program bytes executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_running(&self) -> bool {
        self.state == MachineState::Running
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Consume the machine, handing back its output sink.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<'p, R, W> std::fmt::Debug for Machine<'p, R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("state", &self.state)
            .field("ip", &self.ip)
            .field("steps", &self.steps)
            .field("tape", &self.tape)
            .finish()
    }
}

/// Find the `]` matching the `[` at `open`, scanning forward.
fn find_close(program: &[u8], open: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, &b) in program.iter().enumerate().skip(open + 1) {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Find the `[` matching the `]` at `close`, scanning backward.
fn find_open(program: &[u8], close: usize) -> Option<usize> {
    let mut depth = 1usize;
    for i in (0..close).rev() {
        match program[i] {
            b']' => depth += 1,
            b'[' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Run a program against an in-memory input buffer and collect its output.
pub fn run_buffered(program: &Program, input: &[u8]) -> Result<(Vec<u8>, RunReport), VmError> {
    let mut machine = Machine::new(program, input, Vec::new());
    let report = machine.run(&CancelToken::new())?;
    Ok((machine.into_output(), report))
}

/// Fatal conditions that abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("data pointer out of bounds at instruction {ip}: {source}")]
    DataPointerOutOfBounds { ip: usize, source: TapeError },

    #[error("unmatched [ at instruction {ip}")]
    UnmatchedOpen { ip: usize },

    #[error("unmatched ] at instruction {ip}")]
    UnmatchedClose { ip: usize },

    #[error("output error: {0}")]
    Output(String),

    #[error("machine not running: {0:?}")]
    NotRunning(MachineState),
}

impl VmError {
    fn out_of_bounds(ip: usize, source: TapeError) -> Self {
        VmError::DataPointerOutOfBounds { ip, source }
    }

    /// Program position of the failing instruction, if there is one.
    pub fn ip(&self) -> Option<usize> {
        match self {
            VmError::DataPointerOutOfBounds { ip, .. }
            | VmError::UnmatchedOpen { ip }
            | VmError::UnmatchedClose { ip } => Some(*ip),
            VmError::Output(_) | VmError::NotRunning(_) => None,
        }
    }

    /// True for unmatched bracket errors in either direction.
    pub fn is_unmatched_bracket(&self) -> bool {
        matches!(self, VmError::UnmatchedOpen { .. } | VmError::UnmatchedClose { .. })
    }
}
