//! Console progress dots for long-running steps.

use std::io::{self, Write};

/// Dots allowed on one line before wrapping.
pub const LINE_WIDTH: usize = 80;

/// Prints one `.` per call, wrapping after [`LINE_WIDTH`] dots.
///
/// The count lives in the value itself, so independent steps can keep
/// independent lines.
#[derive(Debug, Default, Clone)]
pub struct ProgressDots {
    count: usize,
}

impl ProgressDots {
    pub fn new() -> Self {
        ProgressDots { count: 0 }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn tick<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if self.count <= LINE_WIDTH {
            out.write_all(b".")?;
            self.count += 1;
        } else {
            out.write_all(b"\n.")?;
            self.count = 1;
        }
        out.flush()
    }
}
