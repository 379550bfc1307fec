// Hit testing - does a tracked body point touch a balloon's hit-box?

use crate::models::game::TargetRect;
use crate::models::pose::Point2D;

/// Half-open containment: `x0 <= x < x1` and `y0 <= y < y1`.
///
/// Points on the left/top edge are inside, points on the right/bottom edge are
/// outside, so two adjacent targets never both claim the same pixel.
pub fn is_point_in_rect(point: Point2D, rect: &TargetRect) -> bool {
    rect.x0 <= point.x && point.x < rect.x1 && rect.y0 <= point.y && point.y < rect.y1
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rect() -> TargetRect {
        TargetRect::new(500.0, 100.0, 600.0, 200.0)
    }

    #[test]
    fn test_half_open_corners() {
        let rect = rect();
        assert!(is_point_in_rect(Point2D::new(rect.x0, rect.y0), &rect));
        assert!(!is_point_in_rect(Point2D::new(rect.x1, rect.y1), &rect));
        assert!(is_point_in_rect(Point2D::new(rect.x1 - 1.0, rect.y1 - 1.0), &rect));
    }

    #[test]
    fn test_right_and_bottom_edges_are_outside() {
        let rect = rect();
        assert!(!is_point_in_rect(Point2D::new(rect.x1, 150.0), &rect));
        assert!(!is_point_in_rect(Point2D::new(550.0, rect.y1), &rect));
        assert!(is_point_in_rect(Point2D::new(rect.x0, 150.0), &rect));
    }

    #[test]
    fn test_adjacent_targets_do_not_share_edge() {
        let left = TargetRect::new(0.0, 0.0, 100.0, 100.0);
        let right = TargetRect::new(100.0, 0.0, 200.0, 100.0);
        let edge = Point2D::new(100.0, 50.0);
        assert!(!is_point_in_rect(edge, &left));
        assert!(is_point_in_rect(edge, &right));
    }

    proptest! {
        #[test]
        fn prop_inside_matches_half_open_law(
            x in -50.0f32..250.0,
            y in -50.0f32..250.0,
        ) {
            let rect = TargetRect::new(0.0, 0.0, 200.0, 200.0);
            let expected = (0.0..200.0).contains(&x) && (0.0..200.0).contains(&y);
            prop_assert_eq!(is_point_in_rect(Point2D::new(x, y), &rect), expected);
        }
    }
}
