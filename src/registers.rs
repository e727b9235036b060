use crate::error::{Chip8Error, Result};
use crate::memory::CHIP8_PROGRAM_ADDR;

pub const CHIP8_REGISTER_COUNT: usize = 16;
pub const CHIP8_STACK_DEPTH: usize = 16;

/// VF doubles as carry/borrow/collision output
pub const FLAG: u8 = 0x0f;

/// V0-VF, I, the program counter and the call stack. the real interpreter kept
/// most of this in the top page of RAM; we don't let programs see it
#[derive(Debug, Clone)]
pub struct RegisterFile {
    v: [u8; CHIP8_REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    stack: heapless::Vec<u16, CHIP8_STACK_DEPTH>,
}

impl RegisterFile {
    pub fn new() -> Self {
        RegisterFile {
            v: [0; CHIP8_REGISTER_COUNT],
            i: 0x0000,
            pc: CHIP8_PROGRAM_ADDR,
            stack: heapless::Vec::new(),
        }
    }

    pub fn get(&self, idx: u8) -> Result<u8> {
        self.v
            .get(idx as usize)
            .copied()
            .ok_or(Chip8Error::InvalidRegister(idx))
    }

    pub fn set(&mut self, idx: u8, value: u8) -> Result<()> {
        let r = self
            .v
            .get_mut(idx as usize)
            .ok_or(Chip8Error::InvalidRegister(idx))?;
        *r = value;
        Ok(())
    }

    pub fn set_flag(&mut self, on: bool) {
        self.v[FLAG as usize] = on as u8;
    }

    pub fn v(&self) -> &[u8; CHIP8_REGISTER_COUNT] {
        &self.v
    }

    /// push the current pc, ready for a subroutine call
    pub fn push_pc(&mut self) -> Result<()> {
        self.stack
            .push(self.pc)
            .map_err(|_| Chip8Error::StackOverflow { pc: self.pc })
    }

    /// pop the pc saved by the matching call
    pub fn pop_pc(&mut self) -> Result<()> {
        self.pc = self
            .stack
            .pop()
            .ok_or(Chip8Error::StackUnderflow { pc: self.pc })?;
        Ok(())
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
