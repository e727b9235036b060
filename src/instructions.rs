//! The CHIP-8 instruction set, one handler per instruction family (top nibble).
//!
//! Every handler returns `Ok(true)` when it has set the program counter itself
//! and `Ok(false)` when the interpreter should step over the instruction.
//! Skips never touch the program counter directly; they bump the pending skip
//! count and the interpreter steps over the next instruction on the following
//! cycle.
use crate::display::{unpack_row, SpriteRow};
use crate::error::{Chip8Error, Result};
use crate::interpreter::Chip8Interpreter;
use crate::memory::{glyph_addr, MemoryMap};
use crate::opcode::OpCode;
use rand::Rng;

pub(crate) type Handler = for<'a, 'b> fn(&'b mut Chip8Interpreter<'a>, OpCode) -> Result<bool>;

/// indexed by `n[0]`
pub(crate) const DISPATCH: [Handler; 16] = [
    exec_0, exec_jp, exec_call, exec_se_imm, exec_sne_imm, exec_se_reg, exec_ld_imm,
    exec_add_imm, exec_alu, exec_sne_reg, exec_ld_i, exec_jp_v0, exec_rnd, exec_drw,
    exec_skp, exec_misc,
];

pub(crate) fn handler_for(opcode: OpCode, pc: u16) -> Result<Handler> {
    let family = opcode.family();
    if family >= DISPATCH.len() {
        return Err(Chip8Error::Decode { opcode, pc });
    }
    Ok(DISPATCH[family])
}

fn invalid(vm: &Chip8Interpreter<'_>, opcode: OpCode) -> Chip8Error {
    Chip8Error::InvalidOperand {
        opcode,
        pc: vm.registers.pc,
    }
}

fn skip_if(vm: &mut Chip8Interpreter<'_>, condition: bool) -> Result<bool> {
    if condition {
        vm.pending_skips += 1;
    }
    Ok(false)
}

/// 00E0 CLS, 00EE RET
fn exec_0(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    match op.word() {
        0x00e0 => vm.display.clear()?,
        // lands back on the call; the interpreter then steps past it
        0x00ee => vm.registers.pop_pc()?,
        _ => return Err(invalid(vm, op)),
    }
    Ok(false)
}

/// 1NNN JP addr
fn exec_jp(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    vm.registers.pc = op.addr();
    Ok(true)
}

/// 2NNN CALL addr
fn exec_call(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    vm.registers.push_pc()?;
    vm.registers.pc = op.addr();
    Ok(true)
}

/// 3XNN SE Vx, byte
fn exec_se_imm(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    let vx = vm.registers.get(op.x())?;
    skip_if(vm, vx == op.low())
}

/// 4XNN SNE Vx, byte
fn exec_sne_imm(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    let vx = vm.registers.get(op.x())?;
    skip_if(vm, vx != op.low())
}

/// 5XY0 SE Vx, Vy
fn exec_se_reg(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    let (vx, vy) = (vm.registers.get(op.x())?, vm.registers.get(op.y())?);
    skip_if(vm, vx == vy)
}

/// 6XNN LD Vx, byte
fn exec_ld_imm(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    vm.registers.set(op.x(), op.low())?;
    Ok(false)
}

/// 7XNN ADD Vx, byte. VF is left alone
fn exec_add_imm(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    let vx = vm.registers.get(op.x())?;
    vm.registers.set(op.x(), vx.wrapping_add(op.low()))?;
    Ok(false)
}

/// 8XYN register to register ALU ops
fn exec_alu(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    let (x, y) = (op.x(), op.y());
    let (vx, vy) = (vm.registers.get(x)?, vm.registers.get(y)?);
    let regs = &mut vm.registers;
    match op.n(3) {
        0x0 => regs.set(x, vy)?,
        0x1 => regs.set(x, vx | vy)?,
        0x2 => regs.set(x, vx & vy)?,
        0x3 => regs.set(x, vx ^ vy)?,
        0x4 => {
            let (sum, carry) = vx.overflowing_add(vy);
            regs.set(x, sum)?;
            regs.set_flag(carry);
        }
        0x5 => {
            regs.set(x, vx.wrapping_sub(vy))?;
            regs.set_flag(vx > vy);
        }
        // flag goes in first, then the shift
        0x6 => {
            regs.set_flag(vx & 0x01 != 0);
            let vx = regs.get(x)?;
            regs.set(x, vx >> 1)?;
        }
        0x7 => {
            regs.set(x, vy.wrapping_sub(vx))?;
            regs.set_flag(vy > vx);
        }
        0xe => {
            regs.set_flag(vx & 0x80 != 0);
            let vx = regs.get(x)?;
            regs.set(x, vx << 1)?;
        }
        _ => return Err(invalid(vm, op)),
    }
    Ok(false)
}

/// 9XY0 SNE Vx, Vy
fn exec_sne_reg(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    let (vx, vy) = (vm.registers.get(op.x())?, vm.registers.get(op.y())?);
    skip_if(vm, vx != vy)
}

/// ANNN LD I, addr
fn exec_ld_i(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    vm.registers.i = op.addr();
    Ok(false)
}

/// BNNN JP V0, addr
fn exec_jp_v0(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    let v0 = vm.registers.get(0)?;
    vm.registers.pc = (op.addr() + v0 as u16) & 0x0fff;
    Ok(true)
}

/// CXNN RND Vx, byte
fn exec_rnd(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    let r: u8 = vm.rng.gen();
    vm.registers.set(op.x(), r & op.low())?;
    Ok(false)
}

/// DXYN DRW Vx, Vy, nibble
fn exec_drw(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    let (vx, vy) = (vm.registers.get(op.x())?, vm.registers.get(op.y())?);
    let rows = vm
        .memory
        .sprite_rows(vm.registers.i, op.n(3) as usize)?
        .iter()
        .map(|b| unpack_row(*b))
        .collect::<Vec<SpriteRow>>();
    let collided = vm.display.draw_sprite(vx, vy, &rows)?;
    vm.registers.set_flag(collided);
    Ok(false)
}

/// EX9E SKP Vx, EXA1 SKNP Vx
fn exec_skp(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    let key = vm.registers.get(op.x())?;
    let down = vm.input.is_down(key);
    match op.low() {
        0x9e => skip_if(vm, down),
        // classic behaviour tests for down here as well
        0xa1 if vm.config.quirks.key_up_skip_checks_release => skip_if(vm, !down),
        0xa1 => skip_if(vm, down),
        _ => Err(invalid(vm, op)),
    }
}

/// FXNN timers, keypad, I and bulk memory ops
fn exec_misc(vm: &mut Chip8Interpreter<'_>, op: OpCode) -> Result<bool> {
    let x = op.x();
    let vx = vm.registers.get(x)?;
    match op.low() {
        0x07 => vm.registers.set(x, vm.timers.delay)?,
        0x0a => {
            let key = vm.input.wait_for_key()?;
            vm.registers.set(x, key)?;
            vm.suspended = true;
        }
        0x15 => vm.timers.delay = vx,
        0x18 => vm.timers.sound = vx,
        0x1e => vm.registers.i = vm.registers.i.wrapping_add(vx as u16),
        0x29 => vm.registers.i = glyph_addr(vx),
        0x33 => {
            let digits = [vx / 100, (vx / 10) % 10, vx % 10];
            vm.memory.write(&digits, vm.registers.i)?;
        }
        0x55 => {
            let count = x as usize + 1;
            let i = vm.registers.i;
            vm.memory.write(&vm.registers.v()[..count], i)?;
            vm.registers.i = i.wrapping_add(count as u16);
        }
        0x65 => {
            let count = x as usize + 1;
            let i = vm.registers.i;
            let values = vm.memory.get_ro_slice(i, count)?;
            for (idx, value) in values.iter().enumerate() {
                vm.registers.set(idx as u8, *value)?;
            }
            vm.registers.i = i.wrapping_add(count as u16);
        }
        _ => return Err(invalid(vm, op)),
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::display::DummyDisplay;
    use crate::input::DummyInput;
    use crate::registers::FLAG;
    use crate::sound::Mute;

    struct Rig {
        display: DummyDisplay,
        input: DummyInput,
        sound: Mute,
    }

    impl Rig {
        fn new() -> Self {
            Rig {
                display: DummyDisplay::new(),
                input: DummyInput::new(&[]),
                sound: Mute::new(),
            }
        }

        fn vm(&mut self) -> Chip8Interpreter<'_> {
            let config = Config {
                seed: Some(8),
                ..Config::default()
            };
            Chip8Interpreter::with_config(
                &mut self.display,
                &mut self.input,
                &mut self.sound,
                config,
            )
            .unwrap()
        }
    }

    fn alu(vx: u8, vy: u8, n: u16) -> (u8, u8) {
        let mut rig = Rig::new();
        let mut vm = rig.vm();
        vm.registers.set(0x1, vx).unwrap();
        vm.registers.set(0x2, vy).unwrap();
        vm.registers.set(FLAG, 0xaa).unwrap();
        let jumped = exec_alu(&mut vm, OpCode::from(0x8120 | n)).unwrap();
        assert!(!jumped);
        (vm.registers.get(0x1).unwrap(), vm.registers.get(FLAG).unwrap())
    }

    #[test]
    fn test_dispatch_covers_every_family() {
        for family in 0..16u16 {
            assert!(handler_for(OpCode::from(family << 12), 0x200).is_ok());
        }
    }

    #[test]
    fn test_add_carry_exhaustive() {
        for a in 0..=255u8 {
            for b in (0..=255u8).step_by(7) {
                let (r, f) = alu(a, b, 0x4);
                assert_eq!(r, ((a as u16 + b as u16) % 256) as u8);
                assert_eq!(f, (a as u16 + b as u16 > 255) as u8, "{} + {}", a, b);
            }
        }
    }

    #[test]
    fn test_sub_not_borrow_exhaustive() {
        for a in 0..=255u8 {
            for b in (0..=255u8).step_by(5) {
                let (r, f) = alu(a, b, 0x5);
                assert_eq!(r, a.wrapping_sub(b));
                assert_eq!(f, (a > b) as u8, "{} - {}", a, b);
            }
        }
    }

    #[test]
    fn test_reverse_sub() {
        assert_eq!(alu(3, 10, 0x7), (7, 1));
        assert_eq!(alu(10, 3, 0x7), (249, 0));
        assert_eq!(alu(4, 4, 0x7), (0, 0));
    }

    #[test]
    fn test_logic_ops() {
        assert_eq!(alu(0x0f, 0xf0, 0x0).0, 0xf0);
        assert_eq!(alu(0x0f, 0xf0, 0x1).0, 0xff);
        assert_eq!(alu(0x3c, 0x0f, 0x2).0, 0x0c);
        assert_eq!(alu(0x3c, 0x0f, 0x3).0, 0x33);
        // VF is untouched by the logic ops
        assert_eq!(alu(0x3c, 0x0f, 0x3).1, 0xaa);
    }

    #[test]
    fn test_shifts_move_bit_into_flag() {
        for v in 0..=255u8 {
            assert_eq!(alu(v, 0, 0x6), (v >> 1, v & 1));
            assert_eq!(alu(v, 0, 0xe), (v << 1, v >> 7));
        }
    }

    #[test]
    fn test_bad_alu_selector() {
        let mut rig = Rig::new();
        let mut vm = rig.vm();
        let e = exec_alu(&mut vm, OpCode::from(0x812f)).unwrap_err();
        assert!(matches!(e, Chip8Error::InvalidOperand { pc: 0x200, .. }));
    }

    #[test]
    fn test_add_immediate_wraps_without_flag() {
        let mut rig = Rig::new();
        let mut vm = rig.vm();
        vm.registers.set(0x3, 0xfe).unwrap();
        exec_add_imm(&mut vm, OpCode::from(0x7303)).unwrap();
        assert_eq!(vm.registers.get(0x3).unwrap(), 0x01);
        assert_eq!(vm.registers.get(FLAG).unwrap(), 0);
    }

    #[test]
    fn test_jump_with_offset_wraps() {
        let mut rig = Rig::new();
        let mut vm = rig.vm();
        vm.registers.set(0x0, 0x20).unwrap();
        assert!(exec_jp_v0(&mut vm, OpCode::from(0xbff0)).unwrap());
        assert_eq!(vm.registers.pc, 0x0010);
    }

    #[test]
    fn test_random_is_masked() {
        let mut rig = Rig::new();
        let mut vm = rig.vm();
        for _ in 0..64 {
            exec_rnd(&mut vm, OpCode::from(0xc50f)).unwrap();
            assert_eq!(vm.registers.get(0x5).unwrap() & 0xf0, 0);
        }
        exec_rnd(&mut vm, OpCode::from(0xc500)).unwrap();
        assert_eq!(vm.registers.get(0x5).unwrap(), 0);
    }

    #[test]
    fn test_bcd_writes_consecutive_bytes() {
        let mut rig = Rig::new();
        let mut vm = rig.vm();
        vm.registers.set(0x7, 254).unwrap();
        vm.registers.i = 0x300;
        exec_misc(&mut vm, OpCode::from(0xf733)).unwrap();
        assert_eq!(vm.memory.get_ro_slice(0x300, 3).unwrap(), &[2, 5, 4]);
        assert_eq!(vm.registers.i, 0x300);
    }

    #[test]
    fn test_store_and_load_registers() {
        let mut rig = Rig::new();
        let mut vm = rig.vm();
        for r in 0..4u8 {
            vm.registers.set(r, 0x10 + r).unwrap();
        }
        vm.registers.i = 0x400;
        exec_misc(&mut vm, OpCode::from(0xf355)).unwrap();
        assert_eq!(
            vm.memory.get_ro_slice(0x400, 5).unwrap(),
            &[0x10, 0x11, 0x12, 0x13, 0x00]
        );
        assert_eq!(vm.registers.i, 0x404);

        for r in 0..4u8 {
            vm.registers.set(r, 0).unwrap();
        }
        vm.registers.i = 0x400;
        exec_misc(&mut vm, OpCode::from(0xf265)).unwrap();
        assert_eq!(&vm.registers.v()[..4], &[0x10, 0x11, 0x12, 0x00]);
        assert_eq!(vm.registers.i, 0x403);
    }

    #[test]
    fn test_store_past_end_of_memory_fails() {
        let mut rig = Rig::new();
        let mut vm = rig.vm();
        vm.registers.i = 0x0ffe;
        let e = exec_misc(&mut vm, OpCode::from(0xf555)).unwrap_err();
        assert!(matches!(e, Chip8Error::InvalidAddress { .. }));
    }

    #[test]
    fn test_timers_and_i() {
        let mut rig = Rig::new();
        let mut vm = rig.vm();
        vm.registers.set(0x2, 0x30).unwrap();
        exec_misc(&mut vm, OpCode::from(0xf215)).unwrap();
        exec_misc(&mut vm, OpCode::from(0xf218)).unwrap();
        assert_eq!((vm.timers.delay, vm.timers.sound), (0x30, 0x30));
        vm.timers.delay = 0x12;
        exec_misc(&mut vm, OpCode::from(0xf307)).unwrap();
        assert_eq!(vm.registers.get(0x3).unwrap(), 0x12);
        vm.registers.i = 0x300;
        exec_misc(&mut vm, OpCode::from(0xf21e)).unwrap();
        assert_eq!(vm.registers.i, 0x330);
        assert_eq!(vm.registers.get(FLAG).unwrap(), 0);
    }

    #[test]
    fn test_glyph_address() {
        let mut rig = Rig::new();
        let mut vm = rig.vm();
        vm.registers.set(0x4, 0x0b).unwrap();
        exec_misc(&mut vm, OpCode::from(0xf429)).unwrap();
        assert_eq!(vm.registers.i, glyph_addr(0x0b));
    }

    #[test]
    fn test_bad_misc_selector() {
        let mut rig = Rig::new();
        let mut vm = rig.vm();
        assert!(matches!(
            exec_misc(&mut vm, OpCode::from(0xf0ff)),
            Err(Chip8Error::InvalidOperand { .. })
        ));
        assert!(matches!(
            exec_0(&mut vm, OpCode::from(0x0123)),
            Err(Chip8Error::InvalidOperand { .. })
        ));
        assert!(matches!(
            exec_skp(&mut vm, OpCode::from(0xe19f)),
            Err(Chip8Error::InvalidOperand { .. })
        ));
    }

    #[test]
    fn test_key_skips_both_check_down() {
        let mut rig = Rig::new();
        rig.input.set_down(0x5, true);
        let mut vm = rig.vm();
        vm.registers.set(0x1, 0x5).unwrap();
        exec_skp(&mut vm, OpCode::from(0xe19e)).unwrap();
        assert_eq!(vm.pending_skips, 1);
        // SKNP with the key down still skips
        exec_skp(&mut vm, OpCode::from(0xe1a1)).unwrap();
        assert_eq!(vm.pending_skips, 2);
        vm.registers.set(0x1, 0x6).unwrap();
        exec_skp(&mut vm, OpCode::from(0xe1a1)).unwrap();
        assert_eq!(vm.pending_skips, 2);
    }

    #[test]
    fn test_key_up_quirk_fixed() {
        let mut rig = Rig::new();
        rig.input.set_down(0x5, true);
        let mut config = Config::default();
        config.quirks.key_up_skip_checks_release = true;
        let mut vm =
            Chip8Interpreter::with_config(&mut rig.display, &mut rig.input, &mut rig.sound, config)
                .unwrap();
        vm.registers.set(0x1, 0x5).unwrap();
        exec_skp(&mut vm, OpCode::from(0xe1a1)).unwrap();
        assert_eq!(vm.pending_skips, 0);
        vm.registers.set(0x1, 0x6).unwrap();
        exec_skp(&mut vm, OpCode::from(0xe1a1)).unwrap();
        assert_eq!(vm.pending_skips, 1);
    }

    #[test]
    fn test_draw_glyph() {
        let mut rig = Rig::new();
        {
            let mut vm = rig.vm();
            vm.registers.i = glyph_addr(0x0);
            vm.registers.set(0x0, 1).unwrap();
            vm.registers.set(0x1, 2).unwrap();
            exec_drw(&mut vm, OpCode::from(0xd015)).unwrap();
            assert_eq!(vm.registers.get(FLAG).unwrap(), 0);
        }
        // top row of the 0 glyph is 0xF0, then 0x90
        let frame = rig.display.frame();
        assert!(frame.pixel(1, 2));
        assert!(frame.pixel(4, 2));
        assert!(!frame.pixel(5, 2));
        assert!(frame.pixel(1, 3));
        assert!(!frame.pixel(2, 3));
        assert!(frame.pixel(4, 3));
    }

    #[test]
    fn test_draw_twice_collides() {
        let mut rig = Rig::new();
        {
            let mut vm = rig.vm();
            vm.registers.i = glyph_addr(0x8);
            vm.registers.set(0x0, 60).unwrap();
            vm.registers.set(0x1, 30).unwrap();
            exec_drw(&mut vm, OpCode::from(0xd015)).unwrap();
            assert_eq!(vm.registers.get(FLAG).unwrap(), 0);
            exec_drw(&mut vm, OpCode::from(0xd015)).unwrap();
            assert_eq!(vm.registers.get(FLAG).unwrap(), 1);
        }
        assert_eq!(rig.display.sprites, 2);
        assert!(rig.display.frame().data().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_draw_from_ram() {
        let mut rig = Rig::new();
        {
            let mut vm = rig.vm();
            vm.memory.write(&[0x81], 0x300).unwrap();
            vm.registers.i = 0x300;
            exec_drw(&mut vm, OpCode::from(0xd001)).unwrap();
        }
        let frame = rig.display.frame();
        assert!(frame.pixel(0, 0));
        assert!(frame.pixel(7, 0));
        assert!(!frame.pixel(1, 0));
    }

    #[test]
    fn test_wait_for_key_suspends() {
        let mut rig = Rig::new();
        rig.input = DummyInput::new(&[]).with_presses(&[0x0c]);
        let mut vm = rig.vm();
        exec_misc(&mut vm, OpCode::from(0xf90a)).unwrap();
        assert_eq!(vm.registers.get(0x9).unwrap(), 0x0c);
        assert!(vm.suspended);
    }
}
