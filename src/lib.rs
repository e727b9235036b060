//! A CHIP-8 interpreter.
//!
//! ## Design
//!
//! * one instruction per loop cycle at a bounded rate, then sleep until the
//!   next slot; not cycle-accurate to the COSMAC VIP
//! * timers count down at 60Hz of wall-clock time, polled inside the same loop
//!   so ticks and instructions never race
//! * abstract display so can plug alternatives; starting with TUI in-console
//! * same for the keypad and the buzzer
//! * all machine state is owned by one `Chip8Interpreter`; no globals
//!
//! Model
//!
//! main
//!  |-- display, input, sound, config
//!  |-- interpreter(display, input, sound, config)
//!  |    |-- memory (program RAM at 0x200-0xfff, built-in font outside it)
//!  |    |-- registers (V0-VF, I, PC, call stack)
//!  |    |-- timers (delay, sound)
//!  |    `-- instruction set (dispatch table on the top nibble)
//!  `-- main loop
//!       |-- timers.advance(elapsed)         // 60Hz ticks, display refresh
//!       |-- input.poll()
//!       |-- cycle()                         // one instruction or one skip
//!       `-- sleep(until next slot)
pub mod config;
pub mod display;
pub mod error;
pub mod input;
mod instructions;
pub mod interpreter;
pub mod memory;
pub mod opcode;
pub mod registers;
pub mod sound;
pub mod timer;

pub use config::{Config, Quirks};
pub use error::{Chip8Error, Result};
pub use interpreter::Chip8Interpreter;
