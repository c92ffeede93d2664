//! Opcode decoding.
//!
//! Eight bytes carry meaning; every other byte is inert.

use serde::{Serialize, Deserialize};

/// A decoded instruction byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// `>`: move the data pointer one cell right
    MoveRight,
    /// `<`: move the data pointer one cell left
    MoveLeft,
    /// `+`: increment the current cell (wrapping)
    Increment,
    /// `-`: decrement the current cell (wrapping)
    Decrement,
    /// `.`: write the current cell to output
    Output,
    /// `,`: read one byte into the current cell
    Input,
    /// `[`: skip past the matching `]` if the current cell is zero
    LoopOpen,
    /// `]`: return to the matching `[` if the current cell is nonzero
    LoopClose,
}

impl Opcode {
    pub const ALL: [Opcode; 8] = [
        Opcode::MoveRight,
        Opcode::MoveLeft,
        Opcode::Increment,
        Opcode::Decrement,
        Opcode::Output,
        Opcode::Input,
        Opcode::LoopOpen,
        Opcode::LoopClose,
    ];

    /// Decode a program byte. Returns `None` for inert bytes.
    #[inline]
    pub fn decode(byte: u8) -> Option<Self> {
        let op = match byte {
            b'>' => Opcode::MoveRight,
            b'<' => Opcode::MoveLeft,
            b'+' => Opcode::Increment,
            b'-' => Opcode::Decrement,
            b'.' => Opcode::Output,
            b',' => Opcode::Input,
            b'[' => Opcode::LoopOpen,
            b']' => Opcode::LoopClose,
            _ => return None,
        };
        Some(op)
    }

    /// The source byte for this opcode.
    pub const fn byte(self) -> u8 {
        match self {
            Opcode::MoveRight => b'>',
            Opcode::MoveLeft => b'<',
            Opcode::Increment => b'+',
            Opcode::Decrement => b'-',
            Opcode::Output => b'.',
            Opcode::Input => b',',
            Opcode::LoopOpen => b'[',
            Opcode::LoopClose => b']',
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.byte() as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_opcodes() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::decode(op.byte()), Some(op));
        }
    }

    #[test]
    fn test_exactly_eight_bytes_decode() {
        let decoded = (0..=255u8).filter(|&b| Opcode::decode(b).is_some()).count();
        assert_eq!(decoded, 8);
    }

    #[test]
    fn test_display_is_source_byte() {
        assert_eq!(Opcode::LoopOpen.to_string(), "[");
        assert_eq!(Opcode::MoveLeft.to_string(), "<");
    }

    #[test]
    fn test_inert_bytes() {
        for b in [b' ', b'\n', b'a', b'#', 0u8, 0xff] {
            assert_eq!(Opcode::decode(b), None);
        }
    }
}
