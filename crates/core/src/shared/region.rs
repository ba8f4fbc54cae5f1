use serde::{Deserialize, Serialize};

/// Axis-aligned face bounding box in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    /// Builds a region from corner coordinates, rounded to whole pixels.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let x = x1.round() as i32;
        let y = y1.round() as i32;
        Self {
            x,
            y,
            width: (x2.round() as i32 - x).max(0),
            height: (y2.round() as i32 - y).max(0),
        }
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn iou(&self, other: &Region) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let area_a = self.area() as f64;
        let area_b = other.area() as f64;
        inter / (area_a + area_b - inter)
    }

    /// Intersects the region with a `frame_w` x `frame_h` frame.
    ///
    /// Returns `None` when the intersection is empty.
    pub fn clamp(&self, frame_w: u32, frame_h: u32) -> Option<Region> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = (self.x + self.width).min(frame_w as i32);
        let y2 = (self.y + self.height).min(frame_h as i32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Region {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        })
    }

    /// Square box around the region center, side = longer edge.
    pub fn squared(&self) -> Region {
        let side = self.width.max(self.height);
        let cx = self.x + self.width / 2;
        let cy = self.y + self.height / 2;
        Region {
            x: cx - side / 2,
            y: cy - side / 2,
            width: side,
            height: side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn region(x: i32, y: i32, w: i32, h: i32) -> Region {
        Region {
            x,
            y,
            width: w,
            height: h,
        }
    }

    // ── IoU ──────────────────────────────────────────────────────────

    #[test]
    fn test_iou_identical_regions() {
        let a = region(10, 10, 100, 100);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // intersection: [50,0]-[100,100] = 5000, union = 15000
        let a = region(0, 0, 100, 100);
        let b = region(50, 0, 100, 100);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[rstest]
    #[case(region(0, 0, 50, 50), region(100, 100, 50, 50))]
    #[case(region(0, 0, 50, 50), region(50, 0, 50, 50))]
    fn test_iou_disjoint_or_touching_is_zero(#[case] a: Region, #[case] b: Region) {
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    // ── Clamp ────────────────────────────────────────────────────────

    #[test]
    fn test_clamp_inside_is_unchanged() {
        let r = region(10, 10, 20, 20);
        assert_eq!(r.clamp(100, 100), Some(r));
    }

    #[test]
    fn test_clamp_trims_negative_origin() {
        assert_eq!(
            region(-10, -5, 30, 30).clamp(100, 100),
            Some(region(0, 0, 20, 25))
        );
    }

    #[test]
    fn test_clamp_trims_far_edge() {
        assert_eq!(
            region(90, 95, 30, 30).clamp(100, 100),
            Some(region(90, 95, 10, 5))
        );
    }

    #[test]
    fn test_clamp_outside_is_none() {
        assert_eq!(region(200, 200, 10, 10).clamp(100, 100), None);
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn test_from_corners_rounds() {
        assert_eq!(
            Region::from_corners(10.4, 19.6, 50.5, 60.2),
            region(10, 20, 41, 40)
        );
    }

    #[test]
    fn test_from_corners_inverted_has_zero_size() {
        let r = Region::from_corners(50.0, 50.0, 10.0, 10.0);
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn test_squared_uses_longer_edge() {
        let sq = region(10, 20, 40, 20).squared();
        assert_eq!(sq.width, 40);
        assert_eq!(sq.height, 40);
        // center stays at (30, 30)
        assert_eq!(sq.x + sq.width / 2, 30);
        assert_eq!(sq.y + sq.height / 2, 30);
    }
}
