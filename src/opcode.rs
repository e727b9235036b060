use std::fmt;

/// a single CHIP-8 instruction word, fetched big-endian from memory
///
///   n0 n1 n2 n3
///   |  |  |  `-- sub-opcode selector ("N")
///   |  |  `----- usually register "Y"
///   |  `-------- usually register "X"
///   `----------- instruction family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpCode(u16);

impl OpCode {
    pub fn new(high: u8, low: u8) -> Self {
        OpCode(((high as u16) << 8) | low as u16)
    }

    /// nibble 0..=3, most significant first
    pub fn n(&self, idx: usize) -> u8 {
        debug_assert!(idx < 4);
        ((self.0 >> (12 - 4 * idx)) & 0x0f) as u8
    }

    pub fn family(&self) -> usize {
        self.n(0) as usize
    }

    pub fn x(&self) -> u8 {
        self.n(1)
    }

    pub fn y(&self) -> u8 {
        self.n(2)
    }

    pub fn high(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// "NN"
    pub fn low(&self) -> u8 {
        self.0 as u8
    }

    /// "NNN"
    pub fn addr(&self) -> u16 {
        self.0 & 0x0fff
    }

    pub fn word(&self) -> u16 {
        self.0
    }
}

impl From<u16> for OpCode {
    fn from(word: u16) -> Self {
        OpCode(word)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}
