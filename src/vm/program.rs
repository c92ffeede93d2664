//! Program store.
//!
//! A program is the raw byte content of its source file. Bytes that are not
//! one of the eight opcodes stay in place and execute as no-ops, so the
//! instruction pointer addresses the file exactly as it was read.

use crate::vm::opcode::Opcode;
use std::path::Path;
use thiserror::Error;

/// An immutable, loaded program.
#[derive(Clone, PartialEq, Eq)]
pub struct Program {
    bytes: Vec<u8>,
}

impl Program {
    /// Wrap an in-memory byte sequence.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }

    /// Load a program from disk, keeping every byte of the file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| LoadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { bytes })
    }

    /// Byte at `ip`, or `None` past the end.
    #[inline]
    pub fn get(&self, ip: usize) -> Option<u8> {
        self.bytes.get(ip).copied()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes that decode to an opcode.
    pub fn opcode_count(&self) -> usize {
        self.bytes
            .iter()
            .filter(|&&b| Opcode::decode(b).is_some())
            .count()
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("len", &self.len())
            .field("opcodes", &self.opcode_count())
            .finish()
    }
}

impl From<&str> for Program {
    fn from(source: &str) -> Self {
        Self::from_bytes(source.as_bytes())
    }
}

/// The program source could not be opened or read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not open {path}: {message}")]
pub struct LoadError {
    pub path: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_len() {
        let program = Program::from("+-x");
        assert_eq!(program.len(), 3);
        assert_eq!(program.get(0), Some(b'+'));
        assert_eq!(program.get(2), Some(b'x'));
        assert_eq!(program.get(3), None);
    }

    #[test]
    fn test_opcode_count_ignores_comments() {
        let program = Program::from("hello [->+<] world.");
        assert_eq!(program.opcode_count(), 7);
    }

    #[test]
    fn test_load_keeps_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.b");
        std::fs::write(&path, b"++\n\xff.").unwrap();

        let program = Program::load(&path).unwrap();

        assert_eq!(program.as_bytes(), b"++\n\xff.");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Program::load("/definitely/not/here.b").unwrap_err();
        assert_eq!(err.path, "/definitely/not/here.b");
        assert!(err.to_string().starts_with("could not open /definitely/not/here.b"));
    }

    #[test]
    fn test_empty_program() {
        let program = Program::from_bytes(Vec::new());
        assert!(program.is_empty());
        assert_eq!(program.get(0), None);
    }
}
