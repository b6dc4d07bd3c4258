//! Sparse per-pixel color storage.

use crate::color::Color;

const CHUNK_BITS: u32 = 4;
const CHUNK_SIZE: u32 = 1 << CHUNK_BITS;
const CHUNK_AREA: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// A grid of optional colors that only allocates 16×16 chunks once a
/// pixel inside them is written.
#[derive(Debug, Clone)]
pub(crate) struct SparseMatrix {
    chunks_wide: u32,
    chunks: Vec<Option<Box<[Option<Color>]>>>,
    len: usize,
}

impl SparseMatrix {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let chunks_wide = width.div_ceil(CHUNK_SIZE);
        let chunks_high = height.div_ceil(CHUNK_SIZE);
        Self {
            chunks_wide,
            chunks: vec![None; chunks_wide as usize * chunks_high as usize],
            len: 0,
        }
    }

    fn locate(&self, x: u32, y: u32) -> (usize, usize) {
        let chunk = (y >> CHUNK_BITS) as usize * self.chunks_wide as usize + (x >> CHUNK_BITS) as usize;
        let offset = ((y & (CHUNK_SIZE - 1)) * CHUNK_SIZE + (x & (CHUNK_SIZE - 1))) as usize;
        (chunk, offset)
    }

    /// The stored color, if `(x, y)` was ever written.
    ///
    /// Callers guarantee the coordinates are inside the grid.
    pub(crate) fn get(&self, x: u32, y: u32) -> Option<Color> {
        let (chunk, offset) = self.locate(x, y);
        self.chunks[chunk].as_ref().and_then(|cells| cells[offset])
    }

    pub(crate) fn set(&mut self, x: u32, y: u32, color: Color) {
        let (chunk, offset) = self.locate(x, y);
        let cells = self.chunks[chunk].get_or_insert_with(|| vec![None; CHUNK_AREA].into_boxed_slice());
        if cells[offset].replace(color).is_none() {
            self.len += 1;
        }
    }

    /// Number of pixels holding a value.
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
