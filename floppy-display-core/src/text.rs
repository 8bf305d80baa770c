//! Text grid
//!
//! The 16x2 character grid both controllers render. Cells hold raw bytes:
//! the LCD gets them verbatim, the OLED maps them through a glyph table.

/// Number of text rows
pub const ROWS: usize = 2;

/// Number of text columns
pub const COLUMNS: usize = 16;

/// 16x2 grid of character cells, blank by default
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TextBuffer {
    cells: [[u8; COLUMNS]; ROWS],
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    /// Create a blank grid
    pub const fn new() -> Self {
        Self {
            cells: [[b' '; COLUMNS]; ROWS],
        }
    }

    /// Copy `text` into `row` starting at `col`
    ///
    /// Cells after the text are space-filled until at least `min_width`
    /// cells have been written. Nothing is written past the last column;
    /// an out-of-range row or column is ignored.
    pub fn write(&mut self, col: usize, row: usize, min_width: usize, text: &str) {
        let Some(line) = self.cells.get_mut(row) else {
            return;
        };
        let Some(cells) = line.get_mut(col..) else {
            return;
        };

        let mut written = 0;
        for (cell, byte) in cells.iter_mut().zip(text.bytes()) {
            *cell = byte;
            written += 1;
        }
        for cell in cells.iter_mut().skip(written).take(min_width.saturating_sub(written)) {
            *cell = b' ';
        }
    }

    /// Blank both rows
    pub fn clear(&mut self) {
        for row in 0..ROWS {
            self.write(0, row, COLUMNS, "");
        }
    }

    /// Borrow one row
    ///
    /// Panics if `row >= ROWS`.
    pub fn row(&self, row: usize) -> &[u8; COLUMNS] {
        &self.cells[row]
    }

    /// Iterate over the rows, top first
    pub fn rows(&self) -> impl Iterator<Item = &[u8; COLUMNS]> {
        self.cells.iter()
    }
}
