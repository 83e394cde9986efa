/// Borrowed interleaved RGB image.
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major RGB triplets, len = w*h*3
}

impl RgbImageView<'_> {
    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    #[inline]
    pub fn hsv(&self, x: usize, y: usize) -> Hsv {
        Hsv::from_rgb(self.rgb(x, y))
    }
}

/// Binary pixel mask. Set pixels hold `255`, unset pixels `0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        self.data[y * self.width + x] = if on { 255 } else { 0 };
    }

    #[inline]
    pub fn value(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Number of set pixels inside `[x0, x1) x [y0, y1)`, clipped to the mask.
    pub fn count_in(&self, x0: usize, x1: usize, y0: usize, y1: usize) -> usize {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        let mut n = 0;
        for y in y0..y1 {
            let row = &self.data[y * self.width..(y + 1) * self.width];
            n += row[x0.min(x1)..x1].iter().filter(|&&v| v != 0).count();
        }
        n
    }

    /// In-place bitwise OR with a mask of the same size.
    pub fn union_with(&mut self, other: &Mask) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a |= b;
        }
    }
}

/// HSV triple in the OpenCV 8-bit convention: `h` in `[0, 180)`, `s` and
/// `v` in `[0, 255]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
        let max = rf.max(gf).max(bf);
        let min = rf.min(gf).min(bf);
        let delta = max - min;

        let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

        let mut h = if delta <= 0.0 {
            0.0
        } else if max == rf {
            60.0 * (gf - bf) / delta
        } else if max == gf {
            120.0 + 60.0 * (bf - rf) / delta
        } else {
            240.0 + 60.0 * (rf - gf) / delta
        };
        if h < 0.0 {
            h += 360.0;
        }

        // 180 wraps to 0 in the half-degree encoding.
        let h = ((h / 2.0).round() as u16 % 180) as u8;
        Self {
            h,
            s: s.round().clamp(0.0, 255.0) as u8,
            v: max as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_matches_opencv_convention() {
        assert_eq!(Hsv::from_rgb([255, 0, 0]), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(Hsv::from_rgb([0, 255, 0]), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(Hsv::from_rgb([0, 0, 255]), Hsv { h: 120, s: 255, v: 255 });
        assert_eq!(Hsv::from_rgb([255, 0, 255]), Hsv { h: 150, s: 255, v: 255 });
        assert_eq!(Hsv::from_rgb([0, 0, 0]), Hsv { h: 0, s: 0, v: 0 });
        assert_eq!(Hsv::from_rgb([200, 200, 200]), Hsv { h: 0, s: 0, v: 200 });
    }

    #[test]
    fn mask_counts_clip_to_bounds() {
        let mut m = Mask::new(4, 3);
        m.set(0, 0, true);
        m.set(3, 2, true);
        assert_eq!(m.count(), 2);
        assert_eq!(m.count_in(1, 10, 0, 10), 1);
        assert_eq!(m.count_in(0, 1, 0, 1), 1);
    }

    #[test]
    fn union_sets_pixels_from_both_sides() {
        let mut a = Mask::new(2, 1);
        let mut b = Mask::new(2, 1);
        a.set(0, 0, true);
        b.set(1, 0, true);
        a.union_with(&b);
        assert_eq!(a.count(), 2);
    }
}
