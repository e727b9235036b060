use crate::error::{Chip8Error, Result};
use log::warn;
use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the memory map programs can see
pub trait MemoryMap {
    /// get a r/w slice of the underlying memory (heap)
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8]>;

    /// get a r/o slice of the underlying memory (heap)
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8]>;

    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) -> Result<()> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    fn get_byte(&self, addr: u16) -> Result<u8> {
        Ok(self.get_ro_slice(addr, 1)?[0])
    }

    fn set_byte(&mut self, addr: u16, value: u8) -> Result<()> {
        self.get_rw_slice(addr, 1)?[0] = value;
        Ok(())
    }

    /// get a big-endian two-byte word (instructions)
    fn get_word(&self, addr: u16) -> Result<u16> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(((word[0] as u16) << 8) | (word[1] as u16))
    }
}

/// where the program is loaded; nothing below this is addressable
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// how much RAM programs get, from 0x200 to the top of a 4K machine
pub const CHIP8_RAM_SIZE_BYTES: usize = 0x0e00;

/// glyphs are addressed one per digit from here, i.e. I = 0x050 + digit. this
/// lives in what used to be the interpreter area so it can never alias program
/// memory
pub const CHIP8_GLYPH_ADDR: u16 = 0x050;
pub const CHIP8_GLYPH_COUNT: u16 = 16;
pub const CHIP8_GLYPH_HEIGHT: usize = 5;

/// Defines the CHIP-8 program memory. logical addresses are translated by
/// subtracting 0x200; anything outside 0x200-0xfff is an error
pub struct Chip8Memory {
    bytes: Box<[u8]>,
}

impl MemoryMap for Chip8Memory {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8]> {
        let a = Self::offset(addr, len)?;
        Ok(&mut self.bytes[a..(a + len)])
    }
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8]> {
        let a = Self::offset(addr, len)?;
        Ok(&self.bytes[a..(a + len)])
    }
}

impl Chip8Memory {
    /// zeroed memory
    pub fn new() -> Self {
        Chip8Memory {
            bytes: vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice(),
        }
    }

    /// translate a logical address into an index into `bytes`, checking the
    /// whole `len` fits
    fn offset(addr: u16, len: usize) -> Result<usize> {
        let invalid = Chip8Error::InvalidAddress { addr };
        let a = (addr as usize)
            .checked_sub(CHIP8_PROGRAM_ADDR as usize)
            .ok_or(invalid)?;
        if a + len > CHIP8_RAM_SIZE_BYTES {
            // report the first byte that's actually out of range
            let bad = (CHIP8_PROGRAM_ADDR as usize + CHIP8_RAM_SIZE_BYTES).max(addr as usize);
            return Err(Chip8Error::InvalidAddress {
                addr: bad.min(u16::MAX as usize) as u16,
            });
        }
        Ok(a)
    }

    /// load a CHIP-8 program image at 0x200, truncating anything that won't
    /// fit. returns the number of bytes loaded
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(self.load_bytes(&buf))
    }

    pub fn load_bytes(&mut self, image: &[u8]) -> usize {
        let len = image.len().min(CHIP8_RAM_SIZE_BYTES);
        if len < image.len() {
            warn!(
                "program is {} bytes; truncated to {}",
                image.len(),
                CHIP8_RAM_SIZE_BYTES
            );
        }
        self.bytes[..len].copy_from_slice(&image[..len]);
        len
    }

    /// `height` rows of sprite data at `addr`, which may be either program
    /// memory or the built-in glyphs
    pub fn sprite_rows(&self, addr: u16, height: usize) -> Result<&[u8]> {
        if is_glyph_addr(addr) {
            let start = (addr - CHIP8_GLYPH_ADDR) as usize * CHIP8_GLYPH_HEIGHT;
            CHIP8_CONTEMPORARY_FONT
                .get(start..start + height)
                .ok_or(Chip8Error::InvalidAddress { addr })
        } else {
            self.get_ro_slice(addr, height)
        }
    }
}

impl Default for Chip8Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// the glyph "address" for a hex digit; only the low nibble counts
pub fn glyph_addr(digit: u8) -> u16 {
    CHIP8_GLYPH_ADDR + (digit & 0x0f) as u16
}

pub fn is_glyph_addr(addr: u16) -> bool {
    (CHIP8_GLYPH_ADDR..CHIP8_GLYPH_ADDR + CHIP8_GLYPH_COUNT).contains(&addr)
}

const CHIP8_CONTEMPORARY_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
