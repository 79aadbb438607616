//! Fixed-size sample stores read and written by table and matrix nodes.
//!
//! Containers are shared handles: cloning a [`Table`] or [`Matrix`] yields a
//! second handle on the same storage, and equality is identity. Storage size
//! is fixed at creation; writes past the end fail with
//! [`CoroError::Configuration`] and leave the contents untouched.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{CoroError, Result};

struct TableData {
    samples: RwLock<Box<[f32]>>,
    sample_rate: f32,
}

/// Single-channel sample table.
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableData>,
}

impl Table {
    /// Create a silent table of `size` samples.
    pub fn new(size: usize, sample_rate: f32) -> Result<Self> {
        Self::from_samples(vec![0.0; size], sample_rate)
    }

    /// Create a table holding `samples`.
    pub fn from_samples(samples: Vec<f32>, sample_rate: f32) -> Result<Self> {
        if samples.is_empty() {
            return Err(CoroError::configuration("table size must be at least 1"));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(CoroError::configuration(format!(
                "table sample rate must be positive, got {sample_rate}"
            )));
        }
        Ok(Self {
            inner: Arc::new(TableData {
                samples: RwLock::new(samples.into_boxed_slice()),
                sample_rate,
            }),
        })
    }

    /// Create a table whose sample `i` is `f(i)`.
    pub fn from_fn(size: usize, sample_rate: f32, f: impl Fn(usize) -> f32) -> Result<Self> {
        Self::from_samples((0..size).map(f).collect(), sample_rate)
    }

    /// One cycle of a sine wave.
    pub fn sine(size: usize, sample_rate: f32) -> Result<Self> {
        let n = size.max(1) as f32;
        Self::from_fn(size, sample_rate, |i| {
            libm::sinf(core::f32::consts::TAU * i as f32 / n)
        })
    }

    /// A Hann window, rising from 0 to 1 and back.
    pub fn hann(size: usize, sample_rate: f32) -> Result<Self> {
        let n = size.saturating_sub(1).max(1) as f32;
        Self::from_fn(size, sample_rate, |i| {
            0.5 - 0.5 * libm::cosf(core::f32::consts::TAU * i as f32 / n)
        })
    }

    /// `channels` independent silent tables of equal size.
    ///
    /// A multi-channel table is a sequence of single-channel tables and
    /// broadcasts like any other sequence.
    pub fn multi(channels: usize, size: usize, sample_rate: f32) -> Result<Vec<Self>> {
        (0..channels)
            .map(|_| Self::new(size, sample_rate))
            .collect()
    }

    /// Number of samples.
    pub fn size(&self) -> usize {
        self.inner.samples.read().len()
    }

    /// Length in seconds at the table's sample rate.
    pub fn duration(&self) -> f32 {
        self.size() as f32 / self.inner.sample_rate
    }

    /// Sample rate the table was created with.
    pub fn sample_rate(&self) -> f32 {
        self.inner.sample_rate
    }

    /// Sample at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.inner.samples.read().get(index).copied()
    }

    /// Linearly interpolated read at a fractional sample position.
    ///
    /// The position wraps around the table length.
    pub fn read_linear(&self, pos: f32) -> f32 {
        let samples = self.inner.samples.read();
        read_wrapped(&samples, pos)
    }

    /// Write one sample.
    pub fn write(&self, index: usize, value: f32) -> Result<()> {
        let mut samples = self.inner.samples.write();
        let size = samples.len();
        match samples.get_mut(index) {
            Some(s) => {
                *s = value;
                Ok(())
            }
            None => Err(CoroError::configuration(format!(
                "write at index {index} past end of table (size {size})"
            ))),
        }
    }

    /// Write `block` starting at `start`. Nothing is written if it does not fit.
    pub fn write_block(&self, start: usize, block: &[f32]) -> Result<()> {
        let mut samples = self.inner.samples.write();
        let end = start.saturating_add(block.len());
        if end > samples.len() {
            return Err(CoroError::configuration(format!(
                "write of {} samples at {start} exceeds table size {}",
                block.len(),
                samples.len()
            )));
        }
        samples[start..end].copy_from_slice(block);
        Ok(())
    }

    /// Set every sample to `value`.
    pub fn fill(&self, value: f32) {
        self.inner.samples.write().fill(value);
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<f32> {
        self.inner.samples.read().to_vec()
    }

    /// Run `f` with shared access to the samples.
    pub fn with_samples<R>(&self, f: impl FnOnce(&[f32]) -> R) -> R {
        f(&self.inner.samples.read())
    }

    /// Run `f` with exclusive access to the samples.
    pub fn with_samples_mut<R>(&self, f: impl FnOnce(&mut [f32]) -> R) -> R {
        f(&mut self.inner.samples.write())
    }

    /// Returns `true` if both handles share storage.
    pub fn ptr_eq(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("size", &self.size())
            .field("sample_rate", &self.inner.sample_rate)
            .finish()
    }
}

/// Linear interpolation with wraparound.
///
/// Empty slices and non-finite positions read as silence.
#[inline]
pub fn read_wrapped(samples: &[f32], pos: f32) -> f32 {
    let len = samples.len();
    if len == 0 || !pos.is_finite() {
        return 0.0;
    }
    let pos = pos.rem_euclid(len as f32);
    let i = (pos as usize).min(len - 1);
    let frac = pos - i as f32;
    let a = samples[i];
    let b = samples[(i + 1) % len];
    a + (b - a) * frac
}

struct MatrixData {
    width: usize,
    height: usize,
    cells: RwLock<Box<[f32]>>,
}

/// Two-dimensional value store, `width` columns by `height` rows, row-major.
#[derive(Clone)]
pub struct Matrix {
    inner: Arc<MatrixData>,
}

impl Matrix {
    /// Create a zeroed matrix.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::from_fn(width, height, |_, _| 0.0)
    }

    /// Create a matrix whose cell `(x, y)` is `f(x, y)`.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoroError::configuration(format!(
                "matrix dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Ok(Self {
            inner: Arc::new(MatrixData {
                width,
                height,
                cells: RwLock::new(cells),
            }),
        })
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.inner.width, self.inner.height)
    }

    /// Total number of cells.
    pub fn size(&self) -> usize {
        self.inner.width * self.inner.height
    }

    /// Cell value, if in range.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.inner.width || y >= self.inner.height {
            return None;
        }
        self.inner.cells.read().get(y * self.inner.width + x).copied()
    }

    /// Set one cell.
    pub fn put(&self, x: usize, y: usize, value: f32) -> Result<()> {
        let (w, h) = self.dimensions();
        if x >= w || y >= h {
            return Err(CoroError::configuration(format!(
                "cell ({x}, {y}) outside {w}x{h} matrix"
            )));
        }
        self.inner.cells.write()[y * w + x] = value;
        Ok(())
    }

    /// Bilinear read at normalized coordinates; `x` and `y` wrap in `[0, 1)`.
    pub fn read_linear(&self, x: f32, y: f32) -> f32 {
        let (w, h) = self.dimensions();
        let cells = self.inner.cells.read();
        let fx = x.rem_euclid(1.0) * w as f32;
        let fy = y.rem_euclid(1.0) * h as f32;
        let x0 = fx as usize % w;
        let y0 = fy as usize % h;
        let x1 = (x0 + 1) % w;
        let y1 = (y0 + 1) % h;
        let tx = fx - libm::floorf(fx);
        let ty = fy - libm::floorf(fy);
        let top = cells[y0 * w + x0] + (cells[y0 * w + x1] - cells[y0 * w + x0]) * tx;
        let bottom = cells[y1 * w + x0] + (cells[y1 * w + x1] - cells[y1 * w + x0]) * tx;
        top + (bottom - top) * ty
    }

    /// Copy of the cells in row-major order.
    pub fn snapshot(&self) -> Vec<f32> {
        self.inner.cells.read().to_vec()
    }

    /// Run `f` with shared access to the row-major cells.
    pub fn with_cells<R>(&self, f: impl FnOnce(&[f32]) -> R) -> R {
        f(&self.inner.cells.read())
    }

    /// Run `f` with exclusive access to the row-major cells.
    pub fn with_cells_mut<R>(&self, f: impl FnOnce(&mut [f32]) -> R) -> R {
        f(&mut self.inner.cells.write())
    }

    /// Returns `true` if both handles share storage.
    pub fn ptr_eq(&self, other: &Matrix) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .finish()
    }
}

/// Either kind of container.
#[derive(Debug, Clone, PartialEq)]
pub enum Container {
    /// Single-channel table.
    Table(Table),
    /// Two-dimensional matrix.
    Matrix(Matrix),
}

impl Container {
    /// Number of stored values.
    pub fn size(&self) -> usize {
        match self {
            Container::Table(t) => t.size(),
            Container::Matrix(m) => m.size(),
        }
    }

    /// Duration in seconds, for tables.
    pub fn duration(&self) -> Option<f32> {
        match self {
            Container::Table(t) => Some(t.duration()),
            Container::Matrix(_) => None,
        }
    }

    /// The table, if this is one.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Container::Table(t) => Some(t),
            Container::Matrix(_) => None,
        }
    }

    /// The matrix, if this is one.
    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            Container::Matrix(m) => Some(m),
            Container::Table(_) => None,
        }
    }
}

impl From<Table> for Container {
    fn from(t: Table) -> Self {
        Container::Table(t)
    }
}

impl From<Matrix> for Container {
    fn from(m: Matrix) -> Self {
        Container::Matrix(m)
    }
}
