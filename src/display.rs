use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// one row of a sprite, most significant bit first
pub type SpriteRow = [bool; 8];

/// Display is used by the interpreter to draw things on the screen. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work.
pub trait Display {
    /// blank the whole screen
    fn clear(&mut self) -> Result<(), io::Error>;

    /// called once at startup with the internal resolution (64x32)
    fn set_extents(&mut self, width: usize, height: usize) -> Result<(), io::Error>;

    /// XOR `rows` onto the screen at x, y, wrapping at the edges. the sprite
    /// height is `rows.len()`. returns true if any lit pixel was turned off
    fn draw_sprite(&mut self, x: u8, y: u8, rows: &[SpriteRow]) -> Result<bool, io::Error>;

    /// push whatever has changed out to the real screen. the interpreter calls
    /// this once per timer tick
    fn refresh(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}

/// expand a byte of sprite data into pixels
pub fn unpack_row(byte: u8) -> SpriteRow {
    let mut row = [false; 8];
    for (bit, px) in row.iter_mut().enumerate() {
        *px = byte & (0x80 >> bit) != 0;
    }
    row
}

// store useful metadata about the screen: width, height, bitplanes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resolution(usize, usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }
    fn byte_count(&self) -> usize {
        (self.0 * self.1 * self.2 + 7) / 8
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0.max(1) - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1.max(1) - 1) as f64, 0.0]
    }

    fn bitplane_from_data<'a>(
        &self,
        data: &'a [u8],
        bitplane: u8,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let mut count = self.pixel_count();
        let w = self.0;
        std::iter::from_fn(move || {
            while count > 0 {
                count -= 1;
                let bit = 1 & (data[count / 8] >> (7 - count % 8));
                if bit == bitplane {
                    return Some((
                        (count % w) as f64,        // x
                        -1.0 * (count / w) as f64, // y
                    ));
                }
            }
            None
        })
    }
}

/// packed 1bpp screen contents, row-major, MSB is the leftmost pixel. this is
/// where the XOR / wrap / collision rules live, so every Display gets them the
/// same
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    resolution: Resolution,
    bytes: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let resolution = Resolution(width, height, 1);
        FrameBuffer {
            resolution,
            bytes: vec![0; resolution.byte_count()],
        }
    }

    pub fn width(&self) -> usize {
        self.resolution.0
    }

    pub fn height(&self) -> usize {
        self.resolution.1
    }

    pub fn data(&self) -> &[u8] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.iter_mut().for_each(|b| *b = 0);
    }

    /// always unlit until the extents are set
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if self.resolution.pixel_count() == 0 {
            return false;
        }
        let (byte, mask) = self.locate(x, y);
        self.bytes[byte] & mask != 0
    }

    fn locate(&self, x: usize, y: usize) -> (usize, u8) {
        let n = (y % self.height()) * self.width() + (x % self.width());
        (n / 8, 0x80 >> (n % 8))
    }

    /// XOR a sprite in, wrapping on both axes; true on collision
    pub fn xor_sprite(&mut self, x: u8, y: u8, rows: &[SpriteRow]) -> bool {
        if self.resolution.pixel_count() == 0 {
            return false;
        }
        let mut collided = false;
        for (dy, row) in rows.iter().enumerate() {
            for (dx, px) in row.iter().enumerate() {
                if !*px {
                    continue;
                }
                let (byte, mask) = self.locate(x as usize + dx, y as usize + dy);
                collided |= self.bytes[byte] & mask != 0;
                self.bytes[byte] ^= mask;
            }
        }
        collided
    }
}

/// monochrome display in a terminal, rendered using TUI and Crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    frame: FrameBuffer,
    dirty: bool,
}

impl MonoTermDisplay {
    pub fn new(x: usize, y: usize) -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            frame: FrameBuffer::new(x, y),
            dirty: true,
        })
    }

    fn render(&mut self) -> Result<(), io::Error> {
        let resolution = self.frame.resolution;
        // expand each bitplane into x, y float coords, suitable for
        // rendering with TUI. this just prints blocky points for now
        let off = resolution
            .bitplane_from_data(self.frame.data(), 0)
            .collect::<Vec<_>>();
        let on = resolution
            .bitplane_from_data(self.frame.data(), 1)
            .collect::<Vec<_>>();

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block) //Braille
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &off,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &on,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        self.dirty = false;
        Ok(())
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

impl Display for MonoTermDisplay {
    fn clear(&mut self) -> Result<(), io::Error> {
        self.frame.clear();
        self.dirty = true;
        Ok(())
    }

    fn set_extents(&mut self, width: usize, height: usize) -> Result<(), io::Error> {
        self.frame = FrameBuffer::new(width, height);
        self.terminal.clear()?;
        self.dirty = true;
        Ok(())
    }

    fn draw_sprite(&mut self, x: u8, y: u8, rows: &[SpriteRow]) -> Result<bool, io::Error> {
        self.dirty = true;
        Ok(self.frame.xor_sprite(x, y, rows))
    }

    fn refresh(&mut self) -> Result<(), io::Error> {
        if self.dirty {
            self.render()?;
        }
        Ok(())
    }
}

/// useful for testing non-display routines; keeps the frame so tests can
/// look at it
pub struct DummyDisplay {
    frame: FrameBuffer,
    pub clears: usize,
    pub sprites: usize,
}

impl DummyDisplay {
    pub fn new() -> Self {
        DummyDisplay {
            frame: FrameBuffer::new(0, 0),
            clears: 0,
            sprites: 0,
        }
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }
}

impl Default for DummyDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DummyDisplay {
    fn clear(&mut self) -> Result<(), io::Error> {
        self.frame.clear();
        self.clears += 1;
        Ok(())
    }

    fn set_extents(&mut self, width: usize, height: usize) -> Result<(), io::Error> {
        self.frame = FrameBuffer::new(width, height);
        Ok(())
    }

    fn draw_sprite(&mut self, x: u8, y: u8, rows: &[SpriteRow]) -> Result<bool, io::Error> {
        self.sprites += 1;
        Ok(self.frame.xor_sprite(x, y, rows))
    }
}
