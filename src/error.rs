use crate::opcode::OpCode;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// everything that stops the interpreter. none of these are recoverable; a
/// real COSMAC VIP would just wander off into the weeds instead
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("unknown instruction family in {opcode} at 0x{pc:04x}")]
    Decode { opcode: OpCode, pc: u16 },

    #[error("invalid operand in {opcode} at 0x{pc:04x}")]
    InvalidOperand { opcode: OpCode, pc: u16 },

    #[error("address 0x{addr:04x} is outside program memory")]
    InvalidAddress { addr: u16 },

    #[error("register V{0:X} does not exist")]
    InvalidRegister(u8),

    #[error("call stack overflow at 0x{pc:04x}")]
    StackOverflow { pc: u16 },

    #[error("return with empty call stack at 0x{pc:04x}")]
    StackUnderflow { pc: u16 },

    #[error("{opcode} at 0x{pc:04x} failed: {source}")]
    Execution {
        opcode: OpCode,
        pc: u16,
        #[source]
        source: Box<Chip8Error>,
    },

    #[error("sound error: {0}")]
    Sound(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl Chip8Error {
    /// attach the offending instruction to an error raised inside a handler
    pub fn during(self, opcode: OpCode, pc: u16) -> Self {
        match self {
            // these already say where they came from
            Chip8Error::Decode { .. }
            | Chip8Error::InvalidOperand { .. }
            | Chip8Error::StackOverflow { .. }
            | Chip8Error::StackUnderflow { .. }
            | Chip8Error::Execution { .. }
            | Chip8Error::Sound(_)
            | Chip8Error::Io(_) => self,
            other => Chip8Error::Execution {
                opcode,
                pc,
                source: Box::new(other),
            },
        }
    }

    /// the input source asked us to stop (e.g. Esc in the terminal)
    pub fn is_quit_request(&self) -> bool {
        matches!(self, Chip8Error::Io(e) if e.kind() == io::ErrorKind::Interrupted)
    }
}
