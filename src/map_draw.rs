//! Map canvas: viewport management and country outline drawing.

use crate::features::{CountryFeature, CoverBucket, FeatureSet};
use geo::{MultiPolygon, Rect, coord};
use ratatui::Frame;
use ratatui::layout::Rect as TuiRect;
use ratatui::style::Color;
use ratatui::widgets::canvas::{Canvas, Context, Line};
use ratatui::widgets::{Block, Borders};

/// Smallest horizontal span the viewport may reach, the analog of a maximum
/// map zoom of 6 (360 degrees / 2^6).
const MIN_SPAN_X: f64 = 360.0 / 64.0;
const MIN_SPAN_Y: f64 = MIN_SPAN_X / 2.0;

/// Padding applied around fitted bounds.
const FIT_PADDING: f64 = 1.1;

const HIGHLIGHT_COLOR: Color = Color::Yellow;

/// The map widget state: world extent plus the current pan/zoom viewport.
pub struct MapView {
    world: Rect<f64>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl MapView {
    pub fn new(set: &FeatureSet) -> Self {
        let world = set
            .features
            .iter()
            .map(|f| f.bounds)
            .reduce(|a, b| {
                Rect::new(
                    coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                    coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
                )
            })
            .unwrap_or_else(|| {
                Rect::new(coord! { x: -180.0, y: -90.0 }, coord! { x: 180.0, y: 90.0 })
            });
        let mut view = Self {
            world,
            x_bounds: [0.0, 0.0],
            y_bounds: [0.0, 0.0],
        };
        view.reset();
        view
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        self.x_bounds
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        self.y_bounds
    }

    /// Back to the full world extent.
    pub fn reset(&mut self) {
        self.x_bounds = [self.world.min().x, self.world.max().x];
        self.y_bounds = [self.world.min().y, self.world.max().y];
    }

    /// Pans/zooms the viewport onto the given bounds, padded, and never
    /// closer than the maximum zoom allows.
    pub fn fit_bounds(&mut self, rect: Rect<f64>) {
        let span_x = (rect.width() * FIT_PADDING).max(MIN_SPAN_X);
        let span_y = (rect.height() * FIT_PADDING).max(MIN_SPAN_Y);
        let center = rect.center();
        self.x_bounds = [center.x - span_x / 2.0, center.x + span_x / 2.0];
        self.y_bounds = [center.y - span_y / 2.0, center.y + span_y / 2.0];
    }

    /// Shifts the viewport by a fraction of its current span.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let shift_x = dx * (self.x_bounds[1] - self.x_bounds[0]);
        let shift_y = dy * (self.y_bounds[1] - self.y_bounds[0]);
        self.x_bounds = [self.x_bounds[0] + shift_x, self.x_bounds[1] + shift_x];
        self.y_bounds = [self.y_bounds[0] + shift_y, self.y_bounds[1] + shift_y];
    }

    /// Scales the span around the viewport center. Factors below 1 zoom in,
    /// clamped at the maximum zoom; factors above 1 zoom out, clamped at the
    /// world extent.
    pub fn zoom(&mut self, factor: f64) {
        let cx = (self.x_bounds[0] + self.x_bounds[1]) / 2.0;
        let cy = (self.y_bounds[0] + self.y_bounds[1]) / 2.0;
        let span_x = ((self.x_bounds[1] - self.x_bounds[0]) * factor)
            .clamp(MIN_SPAN_X, self.world.width().max(MIN_SPAN_X));
        let span_y = ((self.y_bounds[1] - self.y_bounds[0]) * factor)
            .clamp(MIN_SPAN_Y, self.world.height().max(MIN_SPAN_Y));
        self.x_bounds = [cx - span_x / 2.0, cx + span_x / 2.0];
        self.y_bounds = [cy - span_y / 2.0, cy + span_y / 2.0];
    }

    /// Draws every country outline in its bucket color, then the highlighted
    /// one last so it sits on top of the draw order.
    pub fn render(
        &self,
        f: &mut Frame,
        area: TuiRect,
        set: &FeatureSet,
        title: &str,
        highlight: Option<usize>,
    ) {
        let canvas = Canvas::default()
            .block(
                Block::default()
                    .title(title.to_string())
                    .borders(Borders::ALL),
            )
            .x_bounds(self.x_bounds)
            .y_bounds(self.y_bounds)
            .paint(|ctx| {
                for (idx, feature) in set.features.iter().enumerate() {
                    if Some(idx) == highlight {
                        continue;
                    }
                    draw_outline(ctx, &feature.geometry, feature_color(feature));
                }
                if let Some(feature) = highlight.and_then(|idx| set.features.get(idx)) {
                    draw_outline(ctx, &feature.geometry, HIGHLIGHT_COLOR);
                }
            });
        f.render_widget(canvas, area);
    }
}

fn feature_color(feature: &CountryFeature) -> Color {
    CoverBucket::from_pct(Some(feature.pct)).color()
}

/// Draws the exterior ring of every polygon, closing each ring.
fn draw_outline(ctx: &mut Context<'_>, mp: &MultiPolygon<f64>, color: Color) {
    for poly in &mp.0 {
        let ring = &poly.exterior().0;
        for window in ring.windows(2) {
            let (a, b) = (window[0], window[1]);
            ctx.draw(&Line {
                x1: a.x,
                y1: a.y,
                x2: b.x,
                y2: b.y,
                color,
            });
        }
        if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
            ctx.draw(&Line {
                x1: last.x,
                y1: last.y,
                x2: first.x,
                y2: first.y,
                color,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect<f64> {
        Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 })
    }

    #[test]
    fn empty_set_defaults_to_the_whole_world() {
        let view = MapView::new(&FeatureSet::default());
        assert_eq!(view.x_bounds(), [-180.0, 180.0]);
        assert_eq!(view.y_bounds(), [-90.0, 90.0]);
    }

    #[test]
    fn fit_bounds_never_zooms_past_the_maximum() {
        let mut view = MapView::new(&FeatureSet::default());
        view.fit_bounds(rect(9.9, 49.9, 10.1, 50.1));
        let span_x = view.x_bounds()[1] - view.x_bounds()[0];
        let span_y = view.y_bounds()[1] - view.y_bounds()[0];
        assert_eq!(span_x, MIN_SPAN_X);
        assert_eq!(span_y, MIN_SPAN_Y);
        let cx = (view.x_bounds()[0] + view.x_bounds()[1]) / 2.0;
        assert!((cx - 10.0).abs() < 1e-9);
    }

    #[test]
    fn fit_bounds_pads_large_targets() {
        let mut view = MapView::new(&FeatureSet::default());
        view.fit_bounds(rect(-60.0, -10.0, -40.0, 10.0));
        let span_x = view.x_bounds()[1] - view.x_bounds()[0];
        assert!((span_x - 22.0).abs() < 1e-9);
    }

    #[test]
    fn pan_shifts_by_a_fraction_of_the_span() {
        let mut view = MapView::new(&FeatureSet::default());
        view.pan(0.1, 0.0);
        assert_eq!(view.x_bounds(), [-144.0, 216.0]);
        assert_eq!(view.y_bounds(), [-90.0, 90.0]);
    }

    #[test]
    fn zoom_clamps_between_max_zoom_and_world() {
        let mut view = MapView::new(&FeatureSet::default());
        for _ in 0..100 {
            view.zoom(0.5);
        }
        let span_x = view.x_bounds()[1] - view.x_bounds()[0];
        assert_eq!(span_x, MIN_SPAN_X);

        for _ in 0..100 {
            view.zoom(2.0);
        }
        let span_x = view.x_bounds()[1] - view.x_bounds()[0];
        assert_eq!(span_x, 360.0);
    }

    #[test]
    fn reset_restores_the_world_extent() {
        let mut view = MapView::new(&FeatureSet::default());
        view.fit_bounds(rect(0.0, 0.0, 1.0, 1.0));
        view.reset();
        assert_eq!(view.x_bounds(), [-180.0, 180.0]);
    }
}
