//! Named HSV color ranges for the plotted line.

use chart_trace_core::Hsv;
use serde::{Deserialize, Serialize};

/// Inclusive HSV box, OpenCV 8-bit convention (`h` in `[0, 180)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, px: Hsv) -> bool {
        (self.lower[0]..=self.upper[0]).contains(&px.h)
            && (self.lower[1]..=self.upper[1]).contains(&px.s)
            && (self.lower[2]..=self.upper[2]).contains(&px.v)
    }
}

/// A line color with one or more sub-ranges (lighting/anti-aliasing variants).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineColor {
    pub name: String,
    pub ranges: Vec<HsvRange>,
}

impl LineColor {
    pub fn new(name: impl Into<String>, ranges: Vec<HsvRange>) -> Self {
        Self {
            name: name.into(),
            ranges,
        }
    }

    #[inline]
    pub fn matches(&self, px: Hsv) -> bool {
        self.ranges.iter().any(|r| r.contains(px))
    }
}

/// Ordered set of candidate line colors.
///
/// Declaration order breaks score ties in the classifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorProfile {
    pub colors: Vec<LineColor>,
}

impl ColorProfile {
    /// Profile for the four line colors used by the chart renderer.
    pub fn standard() -> Self {
        Self {
            colors: vec![
                LineColor::new(
                    "pink",
                    vec![
                        HsvRange::new([140, 30, 100], [170, 255, 255]),
                        HsvRange::new([160, 20, 150], [179, 255, 255]),
                    ],
                ),
                LineColor::new(
                    "purple",
                    vec![
                        HsvRange::new([120, 30, 80], [150, 255, 255]),
                        HsvRange::new([130, 20, 100], [145, 255, 255]),
                    ],
                ),
                LineColor::new(
                    "blue",
                    vec![
                        HsvRange::new([90, 30, 100], [120, 255, 255]),
                        HsvRange::new([100, 20, 150], [115, 255, 255]),
                    ],
                ),
                LineColor::new(
                    "cyan",
                    vec![
                        HsvRange::new([80, 30, 100], [100, 255, 255]),
                        HsvRange::new([85, 20, 150], [95, 255, 255]),
                    ],
                ),
            ],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.colors.iter().map(|c| c.name.as_str())
    }
}

impl Default for ColorProfile {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_profile_keeps_declaration_order() {
        let profile = ColorProfile::standard();
        let names: Vec<&str> = profile.names().collect();
        assert_eq!(names, ["pink", "purple", "blue", "cyan"]);
    }

    #[test]
    fn sub_ranges_are_unioned() {
        let pink = &ColorProfile::standard().colors[0];
        // Saturated pink hits the first range only.
        assert!(pink.matches(Hsv::from_rgb([255, 80, 180])));
        // Pale pink (low saturation, high value) hits the second range only.
        assert!(pink.matches(Hsv { h: 175, s: 25, v: 200 }));
        assert!(!pink.matches(Hsv::from_rgb([255, 255, 255])));
    }

    #[test]
    fn gray_matches_nothing() {
        let profile = ColorProfile::standard();
        let gray = Hsv::from_rgb([128, 128, 128]);
        assert!(profile.colors.iter().all(|c| !c.matches(gray)));
    }
}
