//! Top-down view of the hoist.
//!
//! The view is a fixed character grid: three banner lines, a bordered
//! frame whose interior spans rows 5..=21 and columns 2..=52, and two
//! status lines below it. Drawing goes through [`Surface`] so the same
//! view renders to a terminal or to memory.

use std::io::{self, BufWriter, Stdout, Write};

// ─── Surface ────────────────────────────────────────────────────────

/// Character-cell drawing target.
pub trait Surface {
    /// Blank the whole surface.
    fn clear(&mut self) -> io::Result<()>;

    /// Write one character at `(row, col)`.
    fn put(&mut self, row: usize, col: usize, ch: char) -> io::Result<()>;

    /// Write `text` starting at `(row, col)` and blank the rest of the row.
    fn print_at(&mut self, row: usize, col: usize, text: &str) -> io::Result<()>;

    /// Make pending writes visible.
    fn flush(&mut self) -> io::Result<()>;
}

/// ANSI/VT100 terminal backend.
///
/// The cursor is hidden while drawing and shown again on drop.
pub struct AnsiTerminal<W: Write> {
    out: W,
}

impl AnsiTerminal<BufWriter<Stdout>> {
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(io::stdout()))
    }
}

impl<W: Write> AnsiTerminal<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Surface for AnsiTerminal<W> {
    fn clear(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[2J\x1b[H\x1b[?25l")
    }

    fn put(&mut self, row: usize, col: usize, ch: char) -> io::Result<()> {
        write!(self.out, "\x1b[{};{}H{ch}", row + 1, col + 1)
    }

    fn print_at(&mut self, row: usize, col: usize, text: &str) -> io::Result<()> {
        write!(self.out, "\x1b[{};{}H{text}\x1b[K", row + 1, col + 1)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl<W: Write> Drop for AnsiTerminal<W> {
    fn drop(&mut self) {
        let _ = self.out.write_all(b"\x1b[?25h\n");
        let _ = self.out.flush();
    }
}

/// In-memory surface. Writes outside the grid are dropped.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    cells: Vec<Vec<char>>,
    clears: usize,
    flushes: usize,
}

impl MemorySurface {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cells: vec![vec![' '; cols]; rows],
            clears: 0,
            flushes: 0,
        }
    }

    /// Character at `(row, col)`, if inside the grid.
    pub fn char_at(&self, row: usize, col: usize) -> Option<char> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Row contents without trailing blanks.
    pub fn row_text(&self, row: usize) -> String {
        self.cells
            .get(row)
            .map(|r| r.iter().collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    /// Number of `clear` calls so far.
    pub fn clears(&self) -> usize {
        self.clears
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Surface for MemorySurface {
    fn clear(&mut self) -> io::Result<()> {
        for row in &mut self.cells {
            row.fill(' ');
        }
        self.clears += 1;
        Ok(())
    }

    fn put(&mut self, row: usize, col: usize, ch: char) -> io::Result<()> {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = ch;
        }
        Ok(())
    }

    fn print_at(&mut self, row: usize, col: usize, text: &str) -> io::Result<()> {
        let Some(cells) = self.cells.get_mut(row) else {
            return Ok(());
        };
        let mut chars = text.chars();
        for cell in cells.iter_mut().skip(col) {
            *cell = chars.next().unwrap_or(' ');
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

// ─── Grid Mapping ───────────────────────────────────────────────────

/// Metres-to-cell mapping of the frame interior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Metres of Z per row.
    pub row_scale: f64,
    /// Metres of X per column.
    pub col_scale: f64,
    /// Rounding bias added before flooring.
    pub bias: f64,
    pub first_row: usize,
    pub last_row: usize,
    pub first_col: usize,
    pub last_col: usize,
}

impl Viewport {
    pub const HOIST: Self = Self {
        row_scale: 0.625,
        col_scale: 0.2,
        bias: 0.2,
        first_row: 5,
        last_row: 21,
        first_col: 2,
        last_col: 52,
    };

    /// `(row, col)` of the hoist at `(x, z)`, clamped to the interior.
    pub fn cell(&self, x: f64, z: f64) -> (usize, usize) {
        let row = Self::place(z / self.row_scale + self.bias, self.first_row, self.last_row);
        let col = Self::place(x / self.col_scale + self.bias, self.first_col, self.last_col);
        (row, col)
    }

    fn place(scaled: f64, first: usize, last: usize) -> usize {
        let offset = scaled.floor() as i64 + first as i64;
        offset.clamp(first as i64, last as i64) as usize
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::HOIST
    }
}

// ─── Hoist View ─────────────────────────────────────────────────────

const BANNER: [&str; 3] = [
    "This is the INSPECTION console.",
    "Press the 'r' for resetting the hoist position",
    "Press the 's' for stopping the hoist movement",
];

const BORDER_ROW: usize = 4;
const STATUS_ROW: usize = 26;
const TIME_ROW: usize = 27;

/// Sign-aware `%.3f`: non-negative values get a leading space so the
/// status line keeps its width.
pub fn format_coordinate(value: f64) -> String {
    if value >= 0.0 {
        format!(" {value:.3}")
    } else {
        format!("{value:.3}")
    }
}

/// Status line for the cached estimates.
pub fn status_line(x: f64, z: f64) -> String {
    format!(
        "Estimated position (X, Z) = ({},{})",
        format_coordinate(x),
        format_coordinate(z)
    )
}

/// Stateful renderer: remembers where the marker was so it can be erased.
#[derive(Debug, Clone, Default)]
pub struct HoistView {
    viewport: Viewport,
    last: Option<(usize, usize)>,
}

impl HoistView {
    /// Cell the marker was last drawn in.
    pub fn last_cell(&self) -> Option<(usize, usize)> {
        self.last
    }

    /// Clear the surface and draw the banner and frame.
    pub fn init<S: Surface + ?Sized>(&mut self, surface: &mut S) -> io::Result<()> {
        surface.clear()?;
        for (row, line) in BANNER.iter().enumerate() {
            surface.print_at(row, 0, line)?;
        }

        let vp = &self.viewport;
        let width = vp.last_col - vp.first_col + 1;
        surface.print_at(BORDER_ROW, 0, &format!("||{}||---> x", "=".repeat(width)))?;
        let interior = format!("||{}||", " ".repeat(width));
        for row in vp.first_row..=vp.last_row {
            surface.print_at(row, 0, &interior)?;
        }
        for (i, label) in ["|", "v", "z"].iter().enumerate() {
            surface.print_at(vp.last_row + 1 + i, 0, label)?;
        }

        self.last = None;
        surface.flush()
    }

    /// Move the marker to `(x, z)` and refresh the status lines.
    pub fn draw<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        x: f64,
        z: f64,
        elapsed_secs: u64,
    ) -> io::Result<()> {
        let top = self.viewport.first_row;
        let (row, col) = self.viewport.cell(x, z);

        if let Some((last_row, last_col)) = self.last {
            for r in top..=last_row {
                surface.put(r, last_col, ' ')?;
            }
        }
        for r in top..row {
            surface.put(r, col, '|')?;
        }
        surface.put(row, col, 'V')?;
        self.last = Some((row, col));

        surface.print_at(STATUS_ROW, 0, &status_line(x, z))?;
        surface.print_at(TIME_ROW, 0, &format!("Execution time = {elapsed_secs}"))?;
        surface.flush()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
