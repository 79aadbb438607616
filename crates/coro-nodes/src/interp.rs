//! Table interpolation modes shared by the table readers.

use core::f32::consts::PI;

/// How a fractional table position is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interp {
    /// Truncate to the previous sample.
    None,
    /// Straight line between neighbours.
    #[default]
    Linear,
    /// Raised-cosine blend between neighbours.
    Cosine,
    /// Four-point cubic (Catmull-Rom).
    Cubic,
}

impl Interp {
    /// Mode from its parameter code: 1 none, 2 linear, 3 cosine, 4 cubic.
    ///
    /// Out-of-range codes fall back to linear.
    pub fn from_code(code: f32) -> Self {
        match code as i32 {
            1 => Interp::None,
            3 => Interp::Cosine,
            4 => Interp::Cubic,
            _ => Interp::Linear,
        }
    }

    /// Parameter code of this mode.
    pub const fn code(self) -> i32 {
        match self {
            Interp::None => 1,
            Interp::Linear => 2,
            Interp::Cosine => 3,
            Interp::Cubic => 4,
        }
    }

    /// Read `samples` at fractional `pos`, wrapping around both ends.
    ///
    /// Empty slices read as silence.
    #[inline]
    pub fn read(self, samples: &[f32], pos: f32) -> f32 {
        let len = samples.len();
        if len == 0 || !pos.is_finite() {
            return 0.0;
        }
        let pos = pos.rem_euclid(len as f32);
        let i = (pos as usize).min(len - 1);
        let frac = pos - i as f32;
        let at = |offset: isize| samples[(i as isize + offset).rem_euclid(len as isize) as usize];

        match self {
            Interp::None => samples[i],
            Interp::Linear => coro_core::read_wrapped(samples, pos),
            Interp::Cosine => {
                let (x0, x1) = (at(0), at(1));
                let t = (1.0 - libm::cosf(frac * PI)) * 0.5;
                x0 + (x1 - x0) * t
            }
            Interp::Cubic => {
                let (xm1, x0, x1, x2) = (at(-1), at(0), at(1), at(2));
                let c1 = 0.5 * (x1 - xm1);
                let c2 = xm1 - 2.5 * x0 + 2.0 * x1 - 0.5 * x2;
                let c3 = 0.5 * (x2 - xm1) + 1.5 * (x0 - x1);
                ((c3 * frac + c2) * frac + c1) * frac + x0
            }
        }
    }
}
