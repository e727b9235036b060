//! # interpreter
//!
//! (from: https://laurencescotford.com/chip-8-on-the-cosmac-vip-initialisation/)
//! the VIP interpreter kept the chip-8 machine state in the top page of RAM and
//! ran one chip-8 instruction per pass of its fetch loop, with the 60Hz
//! interrupt counting the timers down in the background. here:
//!  - V0-VF, I, PC and the stack live in a RegisterFile, not in RAM
//!  - program memory is 0x200-0xfff only; the font lives outside it
//!  - the timers are counted down from wall-clock time polled in the loop
//!    rather than an interrupt, so timer ticks and instructions stay strictly
//!    ordered
//!  - display, keypad and buzzer are traits so the loop doesn't care what's on
//!    the other end
//!
//! each pass of main_loop:
//!  1. account elapsed time into the timers (refreshing the display on a tick)
//!  2. poll the keypad
//!  3. run one instruction, or step over one pending skip
//!  4. sleep until the next instruction slot
use crate::config::Config;
use crate::display::Display;
use crate::error::{Chip8Error, Result};
use crate::input::Input;
use crate::instructions::handler_for;
use crate::memory::{Chip8Memory, MemoryMap};
use crate::opcode::OpCode;
use crate::registers::RegisterFile;
use crate::sound::Sound;
use crate::timer::Timers;
use log::{info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::time::{Duration, Instant};

/// internal resolution of the CHIP-8 display
pub const CHIP8_DISPLAY_WIDTH: usize = 64;
pub const CHIP8_DISPLAY_HEIGHT: usize = 32;

/// every instruction is two bytes
const INSTRUCTION_WIDTH: u16 = 2;

pub struct Chip8Interpreter<'a> {
    pub(crate) memory: Chip8Memory,
    pub(crate) registers: RegisterFile,
    pub(crate) timers: Timers,
    pub(crate) pending_skips: u32,
    /// set by FX0A so the loop knows it was blocked
    pub(crate) suspended: bool,
    pub(crate) display: &'a mut dyn Display,
    pub(crate) input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    /// cleared the first time the buzzer fails; the program carries on silent
    sound_enabled: bool,
    pub(crate) rng: StdRng,
    pub(crate) config: Config,
    cycles: u64,
}

impl<'a> Chip8Interpreter<'a> {
    pub fn new(
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
    ) -> Result<Chip8Interpreter<'a>> {
        Self::with_config(display, input, sound, Config::default())
    }

    pub fn with_config(
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
        config: Config,
    ) -> Result<Chip8Interpreter<'a>> {
        display.set_extents(CHIP8_DISPLAY_WIDTH, CHIP8_DISPLAY_HEIGHT)?;
        display.clear()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Chip8Interpreter {
            memory: Chip8Memory::new(),
            registers: RegisterFile::new(),
            timers: Timers::new(config.timer_hz),
            pending_skips: 0,
            suspended: false,
            display,
            input,
            sound,
            sound_enabled: true,
            rng,
            config,
            cycles: 0,
        })
    }

    /// load a chip8 program
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize> {
        let len = self.memory.load_program(reader)?;
        info!("loaded {} byte program", len);
        Ok(len)
    }

    pub fn load_bytes(&mut self, image: &[u8]) -> usize {
        let len = self.memory.load_bytes(image);
        info!("loaded {} byte program", len);
        len
    }

    /// run one instruction, or step over one that an earlier skip asked us to
    pub fn cycle(&mut self) -> Result<()> {
        self.cycles += 1;
        let pc = self.registers.pc;

        if self.pending_skips > 0 {
            self.pending_skips -= 1;
            self.registers.pc = pc.wrapping_add(INSTRUCTION_WIDTH);
            trace!("0x{:04x}: skipped", pc);
            return Ok(());
        }

        let opcode = OpCode::from(self.memory.get_word(pc)?);
        trace!("0x{:04x}: {}", pc, opcode);
        let handler = handler_for(opcode, pc)?;
        let jumped = handler(self, opcode).map_err(|e| e.during(opcode, pc))?;
        if !jumped {
            self.registers.pc = self.registers.pc.wrapping_add(INSTRUCTION_WIDTH);
        }
        Ok(())
    }

    /// account `elapsed` wall-clock time into the timers; the display gets
    /// refreshed on every tick. returns the number of ticks
    pub fn tick(&mut self, elapsed: Duration) -> Result<u32> {
        let ticks = self.timers.advance(elapsed);
        if ticks > 0 {
            self.display.refresh()?;
        }
        self.update_sound()?;
        Ok(ticks)
    }

    /// buzz while the sound timer is running
    fn update_sound(&mut self) -> Result<()> {
        if !self.sound_enabled {
            return Ok(());
        }
        let result = match (self.timers.is_sounding(), self.sound.is_beeping()) {
            (true, false) => self.sound.beep(),
            (false, true) => self.sound.stop(),
            _ => Ok(()),
        };
        if let Err(e) = result {
            warn!("sound unavailable, carrying on without it: {}", e);
            self.sound_enabled = false;
        }
        Ok(())
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// run until something goes wrong, or for `config.max_cycles` cycles
    pub fn main_loop(&mut self) -> Result<()> {
        let slot = Duration::from_secs(1) / self.config.instructions_per_second.max(1);
        info!(
            "starting at 0x{:04x}, {} instructions/s",
            self.registers.pc, self.config.instructions_per_second
        );

        let result = self.run(slot);
        // don't leave the buzzer on, whatever happened
        if self.sound_enabled {
            self.sound
                .stop()
                .map_err(|e| Chip8Error::Sound(e.to_string()))?;
        }
        info!("stopped after {} cycles", self.cycles);
        result
    }

    fn run(&mut self, slot: Duration) -> Result<()> {
        let mut last = Instant::now();
        let mut deadline = last;
        loop {
            if let Some(max) = self.config.max_cycles {
                if self.cycles >= max {
                    return Ok(());
                }
            }

            let now = Instant::now();
            self.tick(now - last)?;
            last = now;

            self.input.poll()?;
            self.cycle()?;
            self.update_sound()?;

            if self.suspended {
                // the timers stood still while we waited for a key
                self.suspended = false;
                self.timers.discard_pending();
                last = Instant::now();
                deadline = last;
            }

            deadline += slot;
            let now = Instant::now();
            if deadline > now {
                spin_sleep::sleep(deadline - now);
            } else {
                // running behind; don't try to catch up in a burst
                deadline = now;
            }
        }
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn pc(&self) -> u16 {
        self.registers.pc
    }

    pub fn i(&self) -> u16 {
        self.registers.i
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn pending_skips(&self) -> u32 {
        self.pending_skips
    }

    pub fn memory(&self) -> &Chip8Memory {
        &self.memory
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}
