use geo::{Coord, Rect};

pub(crate) const DEFAULT_MARGIN: f64 = 10.0;
pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 8.0;
pub(crate) const BASE_STROKE: f64 = 0.5;
pub(crate) const BASE_FONT: f64 = 11.0;

/// Drawing surface dimensions with fixed margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, margin: DEFAULT_MARGIN }
    }

    pub fn with_margin(width: f64, height: f64, margin: f64) -> Self {
        Self { width, height, margin }
    }
}

/// lon/lat -> surface mapping fitted to a bounds rect, preserving aspect
/// ratio and centering the short axis. Y grows downward on the surface.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FitProjection {
    scale: f64,
    min_x: f64,
    max_y: f64,
    offset_x: f64,
    offset_y: f64,
}

impl FitProjection {
    pub(crate) fn fit(viewport: &Viewport, bounds: &Rect<f64>) -> Self {
        let inner_w = (viewport.width - 2.0 * viewport.margin).max(1.0);
        let inner_h = (viewport.height - 2.0 * viewport.margin).max(1.0);
        let bounds_w = bounds.width().max(f64::EPSILON);
        let bounds_h = bounds.height().max(f64::EPSILON);

        let scale = (inner_w / bounds_w).min(inner_h / bounds_h);
        let offset_x = viewport.margin + (inner_w - bounds_w * scale) / 2.0;
        let offset_y = viewport.margin + (inner_h - bounds_h * scale) / 2.0;

        Self { scale, min_x: bounds.min().x, max_y: bounds.max().y, offset_x, offset_y }
    }

    pub(crate) fn project(&self, coord: &Coord<f64>) -> (f64, f64) {
        let x = self.offset_x + (coord.x - self.min_x) * self.scale;
        let y = self.offset_y + (self.max_y - coord.y) * self.scale;
        (x, y)
    }

    pub(crate) fn unproject(&self, x: f64, y: f64) -> Coord<f64> {
        Coord {
            x: self.min_x + (x - self.offset_x) / self.scale,
            y: self.max_y - (y - self.offset_y) / self.scale,
        }
    }
}

/// Single affine zoom/pan transform over projected surface coordinates,
/// bounded to the configured scale range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self { k: 1.0, x: 0.0, y: 0.0 }
    }
}

impl Transform {
    pub fn apply(&self, point: (f64, f64)) -> (f64, f64) {
        (self.k * point.0 + self.x, self.k * point.1 + self.y)
    }

    pub fn invert(&self, point: (f64, f64)) -> (f64, f64) {
        ((point.0 - self.x) / self.k, (point.1 - self.y) / self.k)
    }

    /// Zoom about an anchor point, keeping it fixed on the surface.
    pub fn zoom_by(&mut self, factor: f64, anchor: (f64, f64)) {
        let k = (self.k * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = k / self.k;
        self.x = anchor.0 - (anchor.0 - self.x) * ratio;
        self.y = anchor.1 - (anchor.1 - self.y) * ratio;
        self.k = k;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    pub fn reset(&mut self) {
        *self = Transform::default();
    }

    /// Inversely scaled so visual stroke weight is constant across zooms.
    pub fn stroke_width(&self) -> f64 {
        BASE_STROKE / self.k
    }

    /// Inversely scaled so labels keep their apparent size across zooms.
    pub fn font_size(&self) -> f64 {
        BASE_FONT / self.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_preserves_aspect_ratio_and_margins() {
        let viewport = Viewport::with_margin(220.0, 120.0, 10.0);
        // Bounds twice as wide as tall: width is the limiting axis.
        let bounds = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 20.0, y: 10.0 });
        let projection = FitProjection::fit(&viewport, &bounds);

        let (x0, y0) = projection.project(&Coord { x: 0.0, y: 10.0 });
        let (x1, y1) = projection.project(&Coord { x: 20.0, y: 0.0 });
        assert!((x0 - 10.0).abs() < 1e-9);
        assert!((x1 - 210.0).abs() < 1e-9);
        // 200x100 drawn area fits exactly in the 100-high inner box.
        assert!((y0 - 10.0).abs() < 1e-9);
        assert!((y1 - 110.0).abs() < 1e-9);
    }

    #[test]
    fn unproject_inverts_project() {
        let viewport = Viewport::new(640.0, 480.0);
        let bounds = Rect::new(Coord { x: 20.0, y: 43.5 }, Coord { x: 30.0, y: 48.5 });
        let projection = FitProjection::fit(&viewport, &bounds);

        let coord = Coord { x: 23.6, y: 46.8 };
        let (x, y) = projection.project(&coord);
        let back = projection.unproject(x, y);
        assert!((back.x - coord.x).abs() < 1e-9);
        assert!((back.y - coord.y).abs() < 1e-9);
    }

    #[test]
    fn zoom_is_clamped_and_anchored() {
        let mut transform = Transform::default();
        transform.zoom_by(100.0, (50.0, 50.0));
        assert_eq!(transform.k, MAX_SCALE);

        // The anchor stays fixed under the transform.
        let anchored = transform.apply(transform.invert((50.0, 50.0)));
        assert!((anchored.0 - 50.0).abs() < 1e-9);
        assert!((anchored.1 - 50.0).abs() < 1e-9);

        transform.zoom_by(1e-9, (0.0, 0.0));
        assert_eq!(transform.k, MIN_SCALE);
    }

    #[test]
    fn stroke_and_font_scale_inversely() {
        let mut transform = Transform::default();
        let base = (transform.stroke_width(), transform.font_size());
        transform.zoom_by(2.0, (0.0, 0.0));
        assert!((transform.stroke_width() - base.0 / 2.0).abs() < 1e-12);
        assert!((transform.font_size() - base.1 / 2.0).abs() < 1e-12);
    }
}
