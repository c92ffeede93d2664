//! WebAssembly bindings.
//!
//! Runs a program from source text against a caller-supplied input buffer.

use wasm_bindgen::prelude::*;
use crate::{run_buffered, Program};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    program: Program,
    steps: u64,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Load a program from source text.
    #[wasm_bindgen(constructor)]
    pub fn new(source: &str) -> Self {
        Self {
            program: Program::from(source),
            steps: 0,
        }
    }

    /// Run on a fresh tape and return the output bytes.
    #[wasm_bindgen]
    pub fn run(&mut self, input: &[u8]) -> Result<Vec<u8>, JsError> {
        let (output, report) = run_buffered(&self.program, input)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.steps = report.steps;
        Ok(output)
    }

    /// Like `run`, with text in and text out.
    #[wasm_bindgen]
    pub fn run_text(&mut self, input: &str) -> Result<String, JsError> {
        let output = self.run(input.as_bytes())?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    /// Program size in bytes.
    #[wasm_bindgen]
    pub fn size(&self) -> usize {
        self.program.len()
    }

    /// Steps executed by the last successful run.
    #[wasm_bindgen]
    pub fn steps(&self) -> u64 {
        self.steps
    }
}
