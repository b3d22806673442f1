//! Conversion between logical drawing units and rendered pixels.
//!
//! All geometry is computed in a fixed logical space (1200 x 720 by default).
//! A [`CoordinateMapper`] is built once per layout pass from the measured
//! rectangle of the diagram surface and converts in both directions.

use fishbone_core::geometry::{Bounds, Point, Size};

/// Maps between the logical drawing space and a measured pixel rectangle.
///
/// # Examples
///
/// ```
/// use fishbone::mapper::CoordinateMapper;
/// use fishbone_core::geometry::{Bounds, Point, Size};
///
/// let surface = Bounds::new_from_top_left(Point::new(100.0, 50.0), Size::new(600.0, 360.0));
/// let mapper = CoordinateMapper::new(Size::new(1200.0, 720.0), surface).unwrap();
///
/// assert_eq!(mapper.to_rendered(Point::new(600.0, 360.0)), Point::new(400.0, 230.0));
/// assert_eq!(mapper.to_logical(Point::new(400.0, 230.0)), Point::new(600.0, 360.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    logical: Size,
    surface: Bounds,
}

impl CoordinateMapper {
    /// Creates a mapper for a surface measured at `surface` (in pixels).
    ///
    /// Returns `None` while the surface has no usable size (zero, negative or
    /// not a number in either dimension) or the logical space is empty, so that
    /// no position is ever written from a division by zero.
    pub fn new(logical: Size, surface: Bounds) -> Option<Self> {
        if logical.is_empty() || surface.to_size().is_empty() || !surface.min_point().is_finite() {
            return None;
        }
        Some(Self { logical, surface })
    }

    /// The logical drawing space.
    pub fn logical_size(&self) -> Size {
        self.logical
    }

    /// The measured surface rectangle, in pixels.
    pub fn surface(&self) -> Bounds {
        self.surface
    }

    /// The logical canvas as a rectangle anchored at the origin.
    pub fn logical_bounds(&self) -> Bounds {
        Bounds::new_from_top_left(Point::default(), self.logical)
    }

    fn scale_x(&self) -> f32 {
        self.surface.width() / self.logical.width()
    }

    fn scale_y(&self) -> f32 {
        self.surface.height() / self.logical.height()
    }

    /// Converts an absolute pixel point (e.g. a pointer position) into logical units.
    pub fn to_logical(&self, pixel: Point) -> Point {
        let local = pixel.sub_point(self.surface.min_point());
        Point::new(local.x() / self.scale_x(), local.y() / self.scale_y())
    }

    /// Converts a logical point into an absolute pixel position.
    pub fn to_rendered(&self, logical: Point) -> Point {
        Point::new(logical.x() * self.scale_x(), logical.y() * self.scale_y())
            .add_point(self.surface.min_point())
    }

    pub fn size_to_logical(&self, size: Size) -> Size {
        Size::new(size.width() / self.scale_x(), size.height() / self.scale_y())
    }

    pub fn size_to_rendered(&self, size: Size) -> Size {
        Size::new(size.width() * self.scale_x(), size.height() * self.scale_y())
    }

    /// Converts a logical rectangle into an absolute pixel rectangle.
    pub fn bounds_to_rendered(&self, bounds: Bounds) -> Bounds {
        Bounds::new_from_top_left(
            self.to_rendered(bounds.min_point()),
            self.size_to_rendered(bounds.to_size()),
        )
    }

    /// Converts an absolute pixel rectangle into a logical rectangle.
    pub fn bounds_to_logical(&self, bounds: Bounds) -> Bounds {
        Bounds::new_from_top_left(
            self.to_logical(bounds.min_point()),
            self.size_to_logical(bounds.to_size()),
        )
    }
}
