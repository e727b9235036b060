use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::{Duration, Instant};

/// keys on the hex keypad
pub const CHIP8_KEY_COUNT: usize = 16;

/// map of the left-hand side of a qwerty keyboard to the COSMAC keypad
///   1 2 3 4      1 2 3 C
///   q w e r  =>  4 5 6 D
///   a s d f      7 8 9 E
///   z x c v      A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00), // x
    ('1', 0x01), // 1
    ('2', 0x02), // 2
    ('3', 0x03), // 3
    ('q', 0x04), // q
    ('w', 0x05), // w
    ('e', 0x06), // e
    ('a', 0x07), // a
    ('s', 0x08), // s
    ('d', 0x09), // d
    ('z', 0x0a), // z
    ('c', 0x0b), // c
    ('4', 0x0c), // 4
    ('r', 0x0d), // r
    ('f', 0x0e), // f
    ('v', 0x0f), // v
];

/// terminals only tell us about presses (and auto-repeats), never releases, so
/// a key stays "down" for this long after we last heard about it
const KEY_HOLD_TIME: Duration = Duration::from_millis(150);

/// reads the keypad
pub trait Input {
    /// refresh pressed/released state from wherever keys come from
    fn poll(&mut self) -> Result<(), io::Error>;

    /// is hex key 0x0-0xf held down, as of the last poll
    fn is_down(&self, key: u8) -> bool;

    /// block until a key is pressed and return it
    fn wait_for_key(&mut self) -> Result<u8, io::Error>;
}

fn quit_requested() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "quit requested from keyboard")
}

/// simple implementation of Input, using raw-mode STDIN via crossterm
pub struct StdinInput {
    last_pressed: [Option<Instant>; CHIP8_KEY_COUNT],
    keymap: HashMap<char, u8>,
}

impl StdinInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            last_pressed: [None; CHIP8_KEY_COUNT],
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
        })
    }

    /// deal with one terminal event; returns the hex key if it was one of ours
    fn handle(&mut self, event: Event) -> Result<Option<u8>, io::Error> {
        match event {
            Event::Key(KeyEvent {
                code: KeyCode::Char('c'),
                modifiers,
                ..
            }) if modifiers.contains(KeyModifiers::CONTROL) => Err(quit_requested()),
            Event::Key(evt) => match evt.code {
                KeyCode::Char(key) => match self.keymap.get(&key.to_ascii_lowercase()) {
                    Some(&mapped_key) => {
                        self.last_pressed[mapped_key as usize] = Some(Instant::now());
                        Ok(Some(mapped_key))
                    }
                    None => {
                        warn!("can't map {:?} to a COSMAC key", key);
                        Ok(None)
                    }
                },
                KeyCode::Esc => Err(quit_requested()),
                _ => {
                    warn!("unknown key event received: {:?}", evt);
                    Ok(None)
                }
            },
            other => {
                debug!("ignoring terminal event {:?}", other);
                Ok(None)
            }
        }
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for StdinInput {
    fn poll(&mut self) -> Result<(), io::Error> {
        while poll(Duration::from_millis(0))? {
            let event = read()?;
            self.handle(event)?;
        }
        Ok(())
    }

    fn is_down(&self, key: u8) -> bool {
        self.last_pressed
            .get(key as usize)
            .copied()
            .flatten()
            .map_or(false, |t| t.elapsed() < KEY_HOLD_TIME)
    }

    fn wait_for_key(&mut self) -> Result<u8, io::Error> {
        loop {
            let event = read()?;
            if let Some(key) = self.handle(event)? {
                return Ok(key);
            }
        }
    }
}

/// dummy Input implementation for testing: some keys held down, and a queue
/// of presses for wait_for_key
pub struct DummyInput {
    down: [bool; CHIP8_KEY_COUNT],
    presses: VecDeque<u8>,
    pub polls: usize,
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        let mut down = [false; CHIP8_KEY_COUNT];
        for &k in keys {
            down[(k & 0x0f) as usize] = true;
        }
        DummyInput {
            down,
            presses: VecDeque::new(),
            polls: 0,
        }
    }

    /// queue up presses to hand out from wait_for_key
    pub fn with_presses(mut self, presses: &[u8]) -> Self {
        self.presses.extend(presses);
        self
    }

    pub fn set_down(&mut self, key: u8, down: bool) {
        self.down[(key & 0x0f) as usize] = down;
    }
}

impl Input for DummyInput {
    fn poll(&mut self) -> Result<(), io::Error> {
        self.polls += 1;
        Ok(())
    }

    fn is_down(&self, key: u8) -> bool {
        self.down.get(key as usize).copied().unwrap_or(false)
    }

    fn wait_for_key(&mut self) -> Result<u8, io::Error> {
        // blocking forever would hang the test, so running dry is an error
        self.presses
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more key presses"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap_covers_keypad() {
        let mut keys = CHIP8_CONVENTIONAL_KEYMAP
            .iter()
            .map(|(_, k)| *k)
            .collect::<Vec<_>>();
        keys.sort_unstable();
        assert_eq!(keys, (0..16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_dummy_keys_down() {
        let mut input = DummyInput::new(&[0x01, 0x0f]);
        assert!(input.is_down(0x01));
        assert!(input.is_down(0x0f));
        assert!(!input.is_down(0x02));
        assert!(!input.is_down(0x10));
        input.set_down(0x01, false);
        assert!(!input.is_down(0x01));
    }

    #[test]
    fn test_dummy_wait_for_key() -> Result<(), io::Error> {
        let mut input = DummyInput::new(&[]).with_presses(&[0x0a, 0x03]);
        assert_eq!(input.wait_for_key()?, 0x0a);
        assert_eq!(input.wait_for_key()?, 0x03);
        assert_eq!(
            input.wait_for_key().unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
        Ok(())
    }

    #[test]
    fn test_dummy_poll_counts() -> Result<(), io::Error> {
        let mut input = DummyInput::new(&[]);
        input.poll()?;
        input.poll()?;
        assert_eq!(input.polls, 2);
        Ok(())
    }
}
