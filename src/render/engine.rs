use std::{io::Write, sync::Arc};

use anyhow::{anyhow, Result};
use geo::{Contains, Coord, Point};

use crate::region::{Region, RegionSet};
use crate::stats::{Observed, RegionStats, StatsMap};
use crate::view::ViewState;

use super::color::{region_fill, NEUTRAL};
use super::label::secondary_label;
use super::svg::{multipolygon_to_path, SvgWriter};
use super::viewport::{FitProjection, Transform, Viewport};

/// Pipeline states that replace or annotate the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Round selected without preloaded data: deliberately grayed map.
    NoDataForRound,
    /// Geometry fetch failed: nothing to draw, show the message instead.
    GeometryUnavailable(String),
}

/// Hover payload: the hovered region's full statistics plus a tooltip anchor
/// kept inside the drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub code: Arc<str>,
    pub name: Arc<str>,
    pub stats: RegionStats,
    pub anchor: (f64, f64),
}

const TOOLTIP_WIDTH: f64 = 180.0;
const TOOLTIP_HEIGHT: f64 = 120.0;
const TOOLTIP_OFFSET: f64 = 12.0;

/// Projects and draws a region set with per-region fills and labels, and
/// answers pointer queries (hit-testing, hover tooltips, clicks).
///
/// Level changes are never initiated here: a click only emits the region
/// code for the navigator.
pub struct RenderEngine {
    viewport: Viewport,
    transform: Transform,
}

impl RenderEngine {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport, transform: Transform::default() }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The fit projection is recomputed from the new dimensions on the next
    /// render; the zoom/pan transform is kept.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn zoom_by(&mut self, factor: f64, anchor: (f64, f64)) {
        self.transform.zoom_by(factor, anchor);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.transform.pan_by(dx, dy);
    }

    pub fn reset_view(&mut self) {
        self.transform.reset();
    }

    fn projection(&self, regions: &RegionSet) -> Result<FitProjection> {
        let bounds = regions
            .bounds()
            .ok_or_else(|| anyhow!("[render] no geometry bounds, nothing to draw"))?;
        Ok(FitProjection::fit(&self.viewport, &bounds))
    }

    /// Draw the full frame. Regions with no statistics entry get the neutral
    /// fill; a no-data notice grays every region and adds the banner.
    pub fn render_svg<W: Write>(
        &self,
        out: W,
        regions: &RegionSet,
        stats: &StatsMap,
        view: &ViewState,
        notice: Option<&Notice>,
    ) -> Result<()> {
        if let Some(Notice::GeometryUnavailable(message)) = notice {
            return self.render_message(out, message);
        }

        let projection = self.projection(regions)?;
        let observed = Observed::from_map(stats);
        let transform = self.transform;
        let grayed = matches!(notice, Some(Notice::NoDataForRound));
        let zero = RegionStats::zero();

        let mut writer = SvgWriter::new(out);
        writer.write_header(self.viewport.width, self.viewport.height, regions.bounds().as_ref())?;
        writer.write_styles()?;
        writeln!(
            writer,
            r#"<g transform="translate({:.3} {:.3}) scale({:.3})">"#,
            transform.x, transform.y, transform.k
        )?;

        for region in regions.iter() {
            let entry = stats.get(&region.code);
            let fill = if grayed {
                NEUTRAL
            } else {
                region_fill(view.metric, view.normalization, entry, view.filter_threshold, &observed)
            };
            let selected = view.selected_parent.as_deref() == Some(&*region.code);
            let stroke = if selected {
                transform.stroke_width() * 3.0
            } else {
                transform.stroke_width()
            };
            let path = multipolygon_to_path(&region.shape, &|c| projection.project(c));
            writeln!(
                writer,
                r#"<path class="rgn" d="{path}" style="fill:{fill};stroke-width:{stroke:.3}" data-code="{code}"/>"#,
                code = region.code,
            )?;
        }

        // Region code at the centroid, metric-dependent second line below it.
        let font = transform.font_size();
        for region in regions.iter() {
            let Some(centroid) = region.centroid else { continue };
            let (x, y) = projection.project(&Coord { x: centroid.x(), y: centroid.y() });
            let entry = stats.get(&region.code).unwrap_or(&zero);
            let (line, opacity) = secondary_label(view.metric, entry);
            writeln!(
                writer,
                r#"<text class="lbl" x="{x:.3}" y="{y:.3}" font-size="{font:.3}"><tspan x="{x:.3}">{code}</tspan><tspan x="{x:.3}" dy="{dy:.3}" opacity="{opacity}">{line}</tspan></text>"#,
                code = region.code,
                dy = font * 1.2,
            )?;
        }

        writeln!(writer, "</g>")?;
        if grayed {
            self.write_banner(&mut writer, "No data for this round")?;
        }
        writer.write_footer()?;
        writer.flush()?;
        Ok(())
    }

    pub fn render_to_string(
        &self,
        regions: &RegionSet,
        stats: &StatsMap,
        view: &ViewState,
        notice: Option<&Notice>,
    ) -> Result<String> {
        let mut buffer = Vec::new();
        self.render_svg(&mut buffer, regions, stats, view, notice)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Fallback document when there is no geometry to draw.
    pub fn render_message<W: Write>(&self, out: W, message: &str) -> Result<()> {
        let mut writer = SvgWriter::new(out);
        writer.write_header(self.viewport.width, self.viewport.height, None)?;
        writer.write_styles()?;
        self.write_banner(&mut writer, message)?;
        writer.write_footer()?;
        writer.flush()?;
        Ok(())
    }

    fn write_banner<W: Write>(&self, writer: &mut SvgWriter<W>, text: &str) -> Result<()> {
        writeln!(
            writer,
            r#"<text class="notice" x="{x:.3}" y="{y:.3}" font-size="16">{text}</text>"#,
            x = self.viewport.width / 2.0,
            y = self.viewport.margin + 20.0,
        )?;
        Ok(())
    }

    /// Region under a surface pointer position, through the zoom/pan
    /// transform and the fit projection.
    pub fn hit_test<'a>(&self, regions: &'a RegionSet, x: f64, y: f64) -> Option<&'a Region> {
        let projection = self.projection(regions).ok()?;
        let (wx, wy) = self.transform.invert((x, y));
        let lonlat = projection.unproject(wx, wy);
        let point = Point::new(lonlat.x, lonlat.y);
        regions.iter().find(|region| region.shape.contains(&point))
    }

    /// Pointer-enter over a region: full statistics plus a clamped tooltip
    /// anchor. Pointer-leave clears by dropping the returned value.
    pub fn hover(
        &self,
        regions: &RegionSet,
        stats: &StatsMap,
        x: f64,
        y: f64,
    ) -> Option<Tooltip> {
        let region = self.hit_test(regions, x, y)?;
        let stats = stats.get(&region.code).cloned().unwrap_or_else(RegionStats::zero);
        Some(Tooltip {
            code: Arc::clone(&region.code),
            name: Arc::clone(&region.name),
            stats,
            anchor: self.tooltip_anchor(x, y),
        })
    }

    /// Click emits the region code; the navigator decides what it means.
    pub fn click(&self, regions: &RegionSet, x: f64, y: f64) -> Option<Arc<str>> {
        self.hit_test(regions, x, y).map(|region| Arc::clone(&region.code))
    }

    /// Anchor below-right of the pointer, flipped above/left near an edge so
    /// the tooltip stays inside the surface.
    fn tooltip_anchor(&self, x: f64, y: f64) -> (f64, f64) {
        let mut ax = x + TOOLTIP_OFFSET;
        let mut ay = y + TOOLTIP_OFFSET;
        if ax + TOOLTIP_WIDTH > self.viewport.width {
            ax = (x - TOOLTIP_OFFSET - TOOLTIP_WIDTH).max(0.0);
        }
        if ay + TOOLTIP_HEIGHT > self.viewport.height {
            ay = (y - TOOLTIP_OFFSET - TOOLTIP_HEIGHT).max(0.0);
        }
        (ax, ay)
    }
}
