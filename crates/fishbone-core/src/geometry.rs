//! Geometric primitives for diagram layout and positioning.
//!
//! This module provides the geometric types used throughout Fishbone for
//! calculating bone rays, attachment points and element rectangles.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate (or displacement vector)
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangle defined by minimum and maximum coordinates
//! - [`Segment`] - A directed line segment between two points
//!
//! # Coordinate System
//!
//! Fishbone uses a coordinate system consistent with SVG and screen pixels:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner at `(0, 0)`
//! - **X-axis**: Increases rightward
//! - **Y-axis**: Increases downward
//!
//! The same types are used for logical drawing units and rendered pixels; the
//! frame a value lives in is a property of where it came from, not of its type.

use serde::{Deserialize, Serialize};

/// A 2D point representing a position (or a displacement) in a coordinate space.
///
/// # Examples
///
/// ```
/// # use fishbone_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
///
/// assert_eq!(p1.dot(p2), 150.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Checks if both x and y coordinates are zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Returns true when both coordinates are finite numbers
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Calculates the hypotenuse (Euclidean distance from origin)
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Multiplies both coordinates by the given factor
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Dot product, treating both points as vectors from the origin
    pub fn dot(self, other: Point) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Converts a point and size into a bounds rectangle
    ///
    /// The point is treated as the center of the bounds.
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_center(self, size)
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height between this size and another
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Multiplies both dimensions by the given factor
    pub fn scale(self, factor: f32) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    /// Returns true if both width and height are zero
    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    /// Returns true if either dimension is zero, negative or not a number.
    ///
    /// An empty size describes an element that has not been laid out yet.
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point {
            x: self.min_x,
            y: self.min_y,
        }
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Moves the bounds by the specified offset.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fishbone_core::geometry::{Bounds, Point, Size};
    /// let bounds = Bounds::new_from_top_left(Point::new(10.0, 20.0), Size::new(50.0, 30.0));
    ///
    /// let moved = bounds.translate(Point::new(100.0, 50.0));
    /// assert_eq!(moved.min_x(), 110.0);
    /// assert_eq!(moved.min_y(), 70.0);
    /// assert_eq!(moved.width(), 50.0);
    /// ```
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Shifts the bounds, keeping its size, so it lies inside `container`.
    ///
    /// When the bounds is larger than the container along an axis it is
    /// aligned to the container's minimum edge on that axis.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fishbone_core::geometry::{Bounds, Point, Size};
    /// let canvas = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 100.0));
    /// let block = Bounds::new_from_top_left(Point::new(-20.0, 90.0), Size::new(30.0, 20.0));
    ///
    /// let clamped = block.clamp_within(canvas);
    /// assert_eq!(clamped.min_x(), 0.0);
    /// assert_eq!(clamped.max_y(), 100.0);
    /// ```
    pub fn clamp_within(&self, container: Bounds) -> Self {
        let x = clamp_axis(self.min_x, self.width(), container.min_x, container.max_x);
        let y = clamp_axis(self.min_y, self.height(), container.min_y, container.max_y);
        Self::new_from_top_left(Point::new(x, y), self.to_size())
    }

    /// Returns true when the point lies inside or on the edge of the bounds
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

fn clamp_axis(start: f32, extent: f32, min: f32, max: f32) -> f32 {
    let upper = (max - extent).max(min);
    start.clamp(min, upper)
}

/// A directed line segment from `start` to `end`.
///
/// Bones, ribs and the spine are all segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    start: Point,
    end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn start(self) -> Point {
        self.start
    }

    pub fn end(self) -> Point {
        self.end
    }

    /// The displacement from `start` to `end`
    pub fn vector(self) -> Point {
        self.end.sub_point(self.start)
    }

    /// Squared length of the segment
    pub fn length_squared(self) -> f32 {
        let v = self.vector();
        v.dot(v)
    }

    pub fn length(self) -> f32 {
        self.vector().hypot()
    }

    /// Maps both endpoints through `f`
    pub fn map(self, mut f: impl FnMut(Point) -> Point) -> Self {
        Self {
            start: f(self.start),
            end: f(self.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_new() {
        let point = Point::new(3.5, 4.25);
        assert_eq!(point.x(), 3.5);
        assert_eq!(point.y(), 4.25);
    }

    #[test]
    fn test_point_default() {
        let point = Point::default();
        assert!(point.is_zero());
    }

    #[test]
    fn test_point_add_sub() {
        let p1 = Point::new(5.0, 8.0);
        let p2 = Point::new(2.0, 3.0);
        assert_eq!(p1.add_point(p2), Point::new(7.0, 11.0));
        assert_eq!(p1.sub_point(p2), Point::new(3.0, 5.0));
    }

    #[test]
    fn test_point_midpoint() {
        let midpoint = Point::new(0.0, 0.0).midpoint(Point::new(4.0, 6.0));
        assert_eq!(midpoint, Point::new(2.0, 3.0));
    }

    #[test]
    fn test_point_hypot() {
        assert_eq!(Point::new(3.0, 4.0).hypot(), 5.0);
        assert_eq!(Point::default().hypot(), 0.0);
    }

    #[test]
    fn test_point_dot() {
        let a = Point::new(1.0, 0.0);
        let b = Point::new(0.0, 1.0);
        assert_eq!(a.dot(b), 0.0);
        assert_eq!(Point::new(2.0, 3.0).dot(Point::new(4.0, -1.0)), 5.0);
    }

    #[test]
    fn test_point_is_finite() {
        assert!(Point::new(1.0, 2.0).is_finite());
        assert!(!Point::new(f32::NAN, 2.0).is_finite());
        assert!(!Point::new(1.0, f32::INFINITY).is_finite());
    }

    #[test]
    fn test_point_to_bounds() {
        let bounds = Point::new(10.0, 20.0).to_bounds(Size::new(6.0, 8.0));

        assert_eq!(bounds.min_x(), 7.0);
        assert_eq!(bounds.min_y(), 16.0);
        assert_eq!(bounds.max_x(), 13.0);
        assert_eq!(bounds.max_y(), 24.0);
    }

    #[test]
    fn test_size_is_empty() {
        assert!(Size::default().is_empty());
        assert!(Size::new(10.0, 0.0).is_empty());
        assert!(Size::new(-1.0, 5.0).is_empty());
        assert!(Size::new(f32::NAN, 5.0).is_empty());
        assert!(!Size::new(1.0, 1.0).is_empty());
    }

    #[test]
    fn test_size_scale_and_max() {
        let size = Size::new(10.0, 20.0);
        assert_eq!(size.scale(0.5), Size::new(5.0, 10.0));
        assert_eq!(size.max(Size::new(15.0, 18.0)), Size::new(15.0, 20.0));
    }

    #[test]
    fn test_bounds_new_from_top_left() {
        let top_left = Point::new(10.0, 20.0);
        let bounds = Bounds::new_from_top_left(top_left, Size::new(30.0, 40.0));

        assert_eq!(bounds.max_x(), 40.0);
        assert_eq!(bounds.max_y(), 60.0);
        assert_eq!(bounds.width(), 30.0);
        assert_eq!(bounds.height(), 40.0);
        assert_eq!(bounds.min_point(), top_left);
        assert_eq!(bounds.center(), Point::new(25.0, 40.0));
    }

    #[test]
    fn test_bounds_clamp_within_inside_is_unchanged() {
        let canvas = Bounds::new_from_top_left(Point::default(), Size::new(100.0, 100.0));
        let bounds = Bounds::new_from_top_left(Point::new(10.0, 10.0), Size::new(20.0, 20.0));
        assert_eq!(bounds.clamp_within(canvas), bounds);
    }

    #[test]
    fn test_bounds_clamp_within_pushes_inside() {
        let canvas = Bounds::new_from_top_left(Point::default(), Size::new(100.0, 50.0));
        let bounds = Bounds::new_from_top_left(Point::new(90.0, -5.0), Size::new(20.0, 10.0));
        let clamped = bounds.clamp_within(canvas);

        assert_eq!(clamped.min_x(), 80.0);
        assert_eq!(clamped.min_y(), 0.0);
        assert_eq!(clamped.to_size(), bounds.to_size());
    }

    #[test]
    fn test_bounds_clamp_within_oversized_aligns_to_min() {
        let canvas = Bounds::new_from_top_left(Point::default(), Size::new(100.0, 50.0));
        let bounds = Bounds::new_from_top_left(Point::new(30.0, 10.0), Size::new(150.0, 10.0));
        let clamped = bounds.clamp_within(canvas);

        assert_eq!(clamped.min_x(), 0.0);
        assert_eq!(clamped.min_y(), 10.0);
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = Bounds::new_from_top_left(Point::default(), Size::new(10.0, 10.0));
        assert!(bounds.contains(Point::new(0.0, 0.0)));
        assert!(bounds.contains(Point::new(10.0, 5.0)));
        assert!(!bounds.contains(Point::new(10.5, 5.0)));
    }

    #[test]
    fn test_segment_lengths() {
        let segment = Segment::new(Point::new(1.0, 1.0), Point::new(4.0, 5.0));
        assert_eq!(segment.vector(), Point::new(3.0, 4.0));
        assert_eq!(segment.length_squared(), 25.0);
        assert_eq!(segment.length(), 5.0);
    }

    #[test]
    fn test_segment_map() {
        let segment = Segment::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        let doubled = segment.map(|p| p.scale(2.0));
        assert_eq!(doubled.start(), Point::new(2.0, 4.0));
        assert_eq!(doubled.end(), Point::new(6.0, 8.0));
    }

    #[test]
    fn test_point_serde_shape() {
        let json = serde_json::to_string(&Point::new(1.5, -2.0)).expect("serializable");
        assert_eq!(json, r#"{"x":1.5,"y":-2.0}"#);
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (
            -1000.0f32..1000.0,
            -1000.0f32..1000.0,
            1.0f32..500.0,
            1.0f32..500.0,
        )
            .prop_map(|(x, y, w, h)| Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h)))
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Clamping into a container preserves the size of the bounds.
    fn check_clamp_preserves_size(bounds: Bounds, container: Bounds) -> Result<(), TestCaseError> {
        let clamped = bounds.clamp_within(container);

        prop_assert!(approx_eq!(f32, clamped.width(), bounds.width(), epsilon = 0.01));
        prop_assert!(approx_eq!(f32, clamped.height(), bounds.height(), epsilon = 0.01));
        Ok(())
    }

    /// A bounds no larger than its container ends up fully inside it.
    fn check_clamp_fits_container(
        container: Bounds,
        origin: Point,
        fraction: f32,
    ) -> Result<(), TestCaseError> {
        let bounds = Bounds::new_from_top_left(origin, container.to_size().scale(fraction));
        let clamped = bounds.clamp_within(container);

        prop_assert!(clamped.min_x() >= container.min_x() - 0.01);
        prop_assert!(clamped.min_y() >= container.min_y() - 0.01);
        prop_assert!(clamped.max_x() <= container.max_x() + 0.01);
        prop_assert!(clamped.max_y() <= container.max_y() + 0.01);
        Ok(())
    }

    /// The dot product is commutative.
    fn check_dot_is_commutative(p1: Point, p2: Point) -> Result<(), TestCaseError> {
        prop_assert!(approx_eq!(f32, p1.dot(p2), p2.dot(p1)));
        Ok(())
    }

    /// Squared segment length matches the dot product of its vector with itself.
    fn check_segment_length_squared(a: Point, b: Point) -> Result<(), TestCaseError> {
        let segment = Segment::new(a, b);
        let length = segment.length();

        let squared = segment.length_squared();

        prop_assert!((squared - length * length).abs() <= squared.max(1.0) * 1e-4);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn clamp_preserves_size(bounds in bounds_strategy(), container in bounds_strategy()) {
            check_clamp_preserves_size(bounds, container)?;
        }

        #[test]
        fn clamp_fits_container(container in bounds_strategy(), origin in point_strategy(), fraction in 0.05f32..1.0) {
            check_clamp_fits_container(container, origin, fraction)?;
        }

        #[test]
        fn dot_is_commutative(p1 in point_strategy(), p2 in point_strategy()) {
            check_dot_is_commutative(p1, p2)?;
        }

        #[test]
        fn segment_length_squared(a in point_strategy(), b in point_strategy()) {
            check_segment_length_squared(a, b)?;
        }
    }
}
