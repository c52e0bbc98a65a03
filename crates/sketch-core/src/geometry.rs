use serde::{Deserialize, Serialize};

/// A 2D point in scene coordinates (canvas units, y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Box with its top-left corner at `origin`.
    pub fn from_origin(origin: Point, width: f64, height: f64) -> Self {
        Self {
            min: origin,
            max: origin.translate(width, height),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// Where a layer sits on the canvas and how it is scaled.
///
/// `left`/`top` locate the layer's top-left corner; scaling is applied about
/// that corner, never rotated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Opacity in `0.0..=1.0`.
    pub opacity: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
        }
    }
}

impl Placement {
    pub fn at(left: f64, top: f64) -> Self {
        Self {
            left,
            top,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale_x = scale;
        self.scale_y = scale;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Map a point from layer-local coordinates to scene coordinates.
    pub fn apply(&self, local: &Point) -> Point {
        Point::new(
            self.left + local.x * self.scale_x,
            self.top + local.y * self.scale_y,
        )
    }

    /// Scene-space bounds of a `width` x `height` local box.
    pub fn bounds(&self, width: f64, height: f64) -> BBox {
        BBox::from_origin(
            self.origin(),
            width * self.scale_x,
            height * self.scale_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_contains_edges() {
        let bb = BBox::from_origin(Point::new(10.0, 10.0), 5.0, 5.0);
        assert!(bb.contains_point(&Point::new(10.0, 10.0)));
        assert!(bb.contains_point(&Point::new(15.0, 15.0)));
        assert!(!bb.contains_point(&Point::new(15.1, 12.0)));
    }

    #[test]
    fn test_placement_apply_scales_about_origin() {
        let p = Placement::at(30.0, 30.0).with_scale(0.5);
        let mapped = p.apply(&Point::new(100.0, 40.0));
        assert!((mapped.x - 80.0).abs() < 1e-10);
        assert!((mapped.y - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_placement_bounds() {
        let p = Placement::at(50.0, 50.0).with_scale(2.0);
        let bb = p.bounds(10.0, 20.0);
        assert!((bb.width() - 20.0).abs() < 1e-10);
        assert!((bb.height() - 40.0).abs() < 1e-10);
        assert!((bb.center().x - 60.0).abs() < 1e-10);
    }

    #[test]
    fn test_opacity_clamped() {
        let p = Placement::default().with_opacity(3.0);
        assert!((p.opacity - 1.0).abs() < 1e-10);
    }
}
