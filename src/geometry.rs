/// Aspect-ratio geometry
///
/// Pure helpers shared by the raster pipeline and the UI:
/// - the closed set of poster aspect ratios
/// - mapping a ratio to its numeric width/height value
/// - mapping a ratio plus a target longest edge to concrete pixel dimensions

use std::fmt;

/// The aspect ratios a poster can be generated at.
///
/// The set is closed: every ratio the UI offers is listed here, and every
/// dimension the export pipeline computes starts from one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    /// 9:16 — vertical story / phone wallpaper
    Portrait9x16,
    /// 1:1 — square social post
    Square,
    /// 16:9 — widescreen banner
    Landscape16x9,
    /// 3:4 — classic portrait print
    Portrait3x4,
    /// 4:3 — classic landscape print
    Landscape4x3,
}

impl AspectRatio {
    /// All ratios, in the order the UI presents them.
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Portrait9x16,
        AspectRatio::Square,
        AspectRatio::Landscape16x9,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
    ];

    /// The "W:H" tag shown in the UI and sent to the model.
    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
        }
    }

    /// Width and height terms of the ratio tag.
    fn parts(self) -> (u32, u32) {
        match self {
            AspectRatio::Portrait9x16 => (9, 16),
            AspectRatio::Square => (1, 1),
            AspectRatio::Landscape16x9 => (16, 9),
            AspectRatio::Portrait3x4 => (3, 4),
            AspectRatio::Landscape4x3 => (4, 3),
        }
    }

    /// Numeric width/height ratio (`W / H`).
    pub fn ratio(self) -> f32 {
        let (w, h) = self.parts();
        w as f32 / h as f32
    }

    /// Pixel dimensions for this ratio given a target longest edge.
    ///
    /// Landscape and square ratios pin the width to `longest_edge`;
    /// portrait ratios pin the height. The other dimension is rounded to
    /// the nearest integer.
    pub fn dimensions_for(self, longest_edge: u32) -> (u32, u32) {
        let ratio = self.ratio();
        if ratio >= 1.0 {
            (longest_edge, (longest_edge as f32 / ratio).round() as u32)
        } else {
            ((longest_edge as f32 * ratio).round() as u32, longest_edge)
        }
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio::Square
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_values() {
        assert_eq!(AspectRatio::Square.ratio(), 1.0);
        assert_eq!(AspectRatio::Landscape16x9.ratio(), 16.0 / 9.0);
        assert_eq!(AspectRatio::Portrait9x16.ratio(), 9.0 / 16.0);
        assert_eq!(AspectRatio::Portrait3x4.ratio(), 0.75);
        assert_eq!(AspectRatio::Landscape4x3.ratio(), 4.0 / 3.0);
    }

    #[test]
    fn test_longest_edge_is_pinned() {
        for ratio in AspectRatio::ALL {
            for edge in [512, 1024, 2000, 4000, 6000] {
                let (width, height) = ratio.dimensions_for(edge);
                assert!(width > 0 && height > 0);
                assert_eq!(
                    width.max(height),
                    edge,
                    "longest edge mismatch for {ratio} at {edge}"
                );
            }
        }
    }

    #[test]
    fn test_known_dimension_table() {
        // The reference values used by the download dialog.
        assert_eq!(AspectRatio::Landscape16x9.dimensions_for(4000), (4000, 2250));
        assert_eq!(AspectRatio::Portrait9x16.dimensions_for(2000), (1125, 2000));
        assert_eq!(AspectRatio::Square.dimensions_for(1024), (1024, 1024));
        assert_eq!(AspectRatio::Portrait3x4.dimensions_for(1024), (768, 1024));
        assert_eq!(AspectRatio::Landscape4x3.dimensions_for(6000), (6000, 4500));
    }

    #[test]
    fn test_orientation_consistency() {
        for ratio in AspectRatio::ALL {
            let (width, height) = ratio.dimensions_for(1000);
            if ratio.ratio() >= 1.0 {
                assert_eq!(width, 1000);
                assert_eq!(height, (1000.0 / ratio.ratio()).round() as u32);
            } else {
                assert_eq!(height, 1000);
                assert_eq!(width, (1000.0 * ratio.ratio()).round() as u32);
            }
        }
    }
}
