use std::{
    io::{
        self,
        Write,
    },
    sync::{
        atomic::{
            AtomicUsize,
            Ordering,
        },
        Arc,
    },
};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::Print,
    terminal::{
        Clear,
        ClearType,
    },
};
use thiserror::Error;

use crate::constants::SCREEN_SIZE;

pub type Grid = [[char; SCREEN_SIZE]; SCREEN_SIZE];

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("screen coordinates out of bounds: ({x}, {y})")]
    OutOfBounds { x: usize, y: usize },

    #[error("rendering failed {0}")]
    Render(#[from] io::Error),
}

/// Render is where a finished grid goes. It should hide the output device, so the screen
/// doesn't care whether it is drawing to a terminal or to nothing at all.
pub trait Render: Send {
    fn render(&mut self, grid: &Grid) -> io::Result<()>;
}

/// The 8x8 character screen and the sink it renders to.
pub struct Screen {
    grid: Grid,
    sink: Box<dyn Render>,
}

impl Screen {
    pub fn new(sink: impl Render + 'static) -> Self {
        Self {
            grid: [[' '; SCREEN_SIZE]; SCREEN_SIZE],
            sink: Box::new(sink),
        }
    }

    #[cfg(test)]
    fn headless() -> Self {
        Self::new(Headless::default())
    }

    pub fn update(&mut self, x: usize, y: usize, character: char) -> Result<(), DisplayError> {
        let cell = self
            .grid
            .get_mut(y)
            .and_then(|row| row.get_mut(x))
            .ok_or(DisplayError::OutOfBounds { x, y })?;
        *cell = character;

        Ok(())
    }

    pub fn draw(&mut self) -> Result<(), DisplayError> {
        self.sink.render(&self.grid)?;
        Ok(())
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        self.grid.get(y).and_then(|row| row.get(x)).copied()
    }
}

/// Lays the grid out in a box-drawing frame, every cell followed by a space.
pub fn frame(grid: &Grid) -> String {
    let border = "─".repeat(SCREEN_SIZE * 2);
    let mut out = format!("┌{border}┐\n");
    for row in grid {
        out.push('│');
        for cell in row {
            out.push(*cell);
            out.push(' ');
        }
        out.push_str("│\n");
    }
    out.push_str(&format!("└{border}┘\n"));
    out
}

/// Clears the terminal and redraws the whole frame from the top-left corner.
pub struct TermRender<W: Write + Send> {
    out: W,
}

impl TermRender<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TermRender<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> Render for TermRender<W> {
    fn render(&mut self, grid: &Grid) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        for line in frame(grid).lines() {
            queue!(self.out, Print(line), Print("\r\n"))?;
        }
        queue!(self.out, Print("\r\n"))?;
        self.out.flush()
    }
}

/// Discards frames and only counts them; clones share the count.
#[derive(Clone, Default)]
pub struct Headless {
    frames: Arc<AtomicUsize>,
}

impl Headless {
    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

impl Render for Headless {
    fn render(&mut self, _grid: &Grid) -> io::Result<()> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_blank() {
        let screen = Screen::headless();
        for y in 0..SCREEN_SIZE {
            for x in 0..SCREEN_SIZE {
                assert_eq!(screen.cell(x, y), Some(' '));
            }
        }
    }

    #[test]
    fn update_is_column_then_row() {
        let mut screen = Screen::headless();
        screen.update(3, 5, 'A').unwrap();

        assert_eq!(screen.cell(3, 5), Some('A'));
        assert_eq!(screen.cell(5, 3), Some(' '));
    }

    #[test]
    fn update_rejects_out_of_bounds() {
        let mut screen = Screen::headless();
        for (x, y) in [(8, 0), (0, 8), (8, 8), (usize::MAX, 0)] {
            assert!(matches!(
                screen.update(x, y, 'A'),
                Err(DisplayError::OutOfBounds { .. })
            ));
        }
        assert!(screen.update(7, 7, 'Z').is_ok());
    }

    #[test]
    fn draw_hits_the_sink() {
        let headless = Headless::default();
        let mut screen = Screen::new(headless.clone());
        screen.draw().unwrap();
        screen.draw().unwrap();

        assert_eq!(headless.frames(), 2);
    }

    #[test]
    fn frame_layout() {
        let mut grid = [[' '; SCREEN_SIZE]; SCREEN_SIZE];
        grid[0][0] = 'H';
        grid[0][1] = 'I';
        let text = frame(&grid);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), SCREEN_SIZE + 2);
        assert_eq!(lines[0], "┌────────────────┐");
        assert_eq!(lines[1], "│H I             │");
        assert_eq!(lines[9], "└────────────────┘");
    }

    #[test]
    fn term_render_writes_frame() {
        let mut out = Vec::new();
        {
            let mut render = TermRender::new(&mut out);
            render.render(&[['x'; SCREEN_SIZE]; SCREEN_SIZE]).unwrap();
        }
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("│x x x x x x x x │"));
    }
}
