//! Binary morphology with square structuring elements.
//!
//! Dilation by an element of size `k` looks at offsets `-(k/2) ..= k-1-k/2`;
//! erosion uses the reflected element, so `close` and `open` never shift an
//! even-sized result. Pixels outside the mask are ignored rather than treated
//! as background, so erosion never eats into the image border.

use chart_trace_core::Mask;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphologyParams {
    /// Side of the square structuring element. `0` or `1` disables clean-up.
    pub kernel_size: usize,
}

impl Default for MorphologyParams {
    fn default() -> Self {
        Self { kernel_size: 3 }
    }
}

#[derive(Clone, Copy)]
enum Op {
    Erode,
    Dilate,
}

fn window(i: usize, k: usize, len: usize, op: Op) -> (usize, usize) {
    let (before, after) = match op {
        Op::Dilate => (k / 2, k - 1 - k / 2),
        Op::Erode => (k - 1 - k / 2, k / 2),
    };
    (i.saturating_sub(before), (i + after).min(len - 1))
}

fn apply(mask: &Mask, k: usize, op: Op) -> Mask {
    if k <= 1 || mask.width == 0 || mask.height == 0 {
        return mask.clone();
    }
    let (w, h) = (mask.width, mask.height);
    let reduce = |acc: u8, v: u8| match op {
        Op::Erode => acc.min(v),
        Op::Dilate => acc.max(v),
    };
    let init = match op {
        Op::Erode => 255u8,
        Op::Dilate => 0u8,
    };

    let mut horiz = vec![0u8; w * h];
    for y in 0..h {
        let row = &mask.data[y * w..(y + 1) * w];
        for x in 0..w {
            let (x0, x1) = window(x, k, w, op);
            horiz[y * w + x] = row[x0..=x1].iter().fold(init, |a, &v| reduce(a, v));
        }
    }

    let mut out = Mask::new(w, h);
    for x in 0..w {
        for y in 0..h {
            let (y0, y1) = window(y, k, h, op);
            out.data[y * w + x] = (y0..=y1).fold(init, |a, yy| reduce(a, horiz[yy * w + x]));
        }
    }
    out
}

pub fn erode(mask: &Mask, k: usize) -> Mask {
    apply(mask, k, Op::Erode)
}

pub fn dilate(mask: &Mask, k: usize) -> Mask {
    apply(mask, k, Op::Dilate)
}

/// Dilate then erode: bridges gaps narrower than `k`.
pub fn close(mask: &Mask, k: usize) -> Mask {
    erode(&dilate(mask, k), k)
}

/// Erode then dilate: removes specks narrower than `k`.
pub fn open(mask: &Mask, k: usize) -> Mask {
    dilate(&erode(mask, k), k)
}

/// Close-then-open clean-up applied to the winning color mask.
pub fn clean(mask: &Mask, params: &MorphologyParams) -> Mask {
    open(&close(mask, params.kernel_size), params.kernel_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hline(w: usize, h: usize, rows: std::ops::Range<usize>) -> Mask {
        let mut m = Mask::new(w, h);
        for y in rows {
            for x in 0..w {
                m.set(x, y, true);
            }
        }
        m
    }

    #[test]
    fn open_removes_isolated_pixel() {
        let mut m = hline(20, 12, 4..7);
        m.set(10, 10, true);
        let cleaned = clean(&m, &MorphologyParams::default());
        assert!(!cleaned.get(10, 10));
        assert_eq!(cleaned, hline(20, 12, 4..7));
    }

    #[test]
    fn close_bridges_one_pixel_gap() {
        let mut m = hline(20, 12, 4..7);
        for y in 4..7 {
            m.set(9, y, false);
        }
        let cleaned = clean(&m, &MorphologyParams::default());
        for y in 4..7 {
            assert!(cleaned.get(9, y), "gap not bridged at row {y}");
        }
    }

    #[test]
    fn border_pixels_survive_erosion() {
        let m = hline(8, 3, 0..3);
        assert_eq!(erode(&m, 3), m);
    }

    #[test]
    fn even_close_does_not_shift() {
        let m = hline(10, 10, 5..6);
        assert_eq!(close(&m, 2), m);
        let mut gap = m.clone();
        gap.set(4, 5, false);
        assert_eq!(close(&gap, 2), m);
    }

    #[test]
    fn kernel_of_one_is_identity() {
        let mut m = Mask::new(5, 5);
        m.set(2, 2, true);
        assert_eq!(clean(&m, &MorphologyParams { kernel_size: 1 }), m);
    }
}
