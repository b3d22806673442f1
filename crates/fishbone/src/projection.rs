//! Pointer-to-parameter projection.
//!
//! Converts a point in logical space into the bone parameter `t` by
//! orthogonal projection onto the bone's spine-to-edge segment, and back.

use fishbone_core::geometry::{Point, Segment};

/// Squared bone lengths at or below this are treated as degenerate.
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Projects `point` onto `bone`, returning the parameter of the nearest point.
///
/// The parameter runs from 0 at the bone's spine anchor to 1 at its edge
/// point. It is not clamped: points beyond either end produce values outside
/// `[0, 1]`, and clamping is left to whoever writes the value into a block.
/// A degenerate bone yields 0.
///
/// # Examples
///
/// ```
/// use fishbone::projection::project_t;
/// use fishbone_core::geometry::{Point, Segment};
///
/// let bone = Segment::new(Point::new(0.0, 0.0), Point::new(0.0, 100.0));
/// assert_eq!(project_t(Point::new(40.0, 25.0), bone), 0.25);
/// assert_eq!(project_t(Point::new(0.0, -50.0), bone), -0.5);
/// ```
pub fn project_t(point: Point, bone: Segment) -> f32 {
    let length_squared = bone.length_squared();
    if length_squared.is_nan() || length_squared <= DEGENERATE_EPSILON {
        return 0.0;
    }

    let t = point.sub_point(bone.start()).dot(bone.vector()) / length_squared;
    if t.is_finite() { t } else { 0.0 }
}

/// Returns the point at parameter `t` along `bone`.
pub fn point_at(bone: Segment, t: f32) -> Point {
    bone.start().add_point(bone.vector().scale(t))
}
