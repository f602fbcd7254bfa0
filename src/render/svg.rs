use std::io::Write;

use anyhow::Result;
use geo::{Coord, CoordsIter, LineString, MultiPolygon, Rect};

/// SVG document writer over any byte sink.
pub(crate) struct SvgWriter<W: Write> {
    writer: W,
}

/// Implement std::io::Write so `write!` / `writeln!` work.
impl<W: Write> Write for SvgWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> { self.writer.write(buf) }

    fn flush(&mut self) -> std::io::Result<()> { self.writer.flush() }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> { self.writer.write_all(buf) }
}

impl<W: Write> SvgWriter<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write the SVG header, including the XML declaration and opening <svg>
    /// tag. Geographic bounds are embedded as data attributes when known.
    pub(crate) fn write_header(
        &mut self,
        width: f64,
        height: f64,
        bounds: Option<&Rect<f64>>,
    ) -> Result<()> {
        writeln!(self, r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"##)?;
        match bounds {
            Some(bounds) => writeln!(
                self,
                r##"<svg xmlns="http://www.w3.org/2000/svg"
            width="{width}" height="{height}"
            viewBox="0 0 {width} {height}"
            data-lon-min="{lon_min}" data-lon-max="{lon_max}"
            data-lat-min="{lat_min}" data-lat-max="{lat_max}">"##,
                lon_min = bounds.min().x,
                lon_max = bounds.max().x,
                lat_min = bounds.min().y,
                lat_max = bounds.max().y,
            )?,
            None => writeln!(
                self,
                r##"<svg xmlns="http://www.w3.org/2000/svg"
            width="{width}" height="{height}"
            viewBox="0 0 {width} {height}">"##,
            )?,
        }
        writeln!(self, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##)?;
        Ok(())
    }

    /// Write SVG styles for map features.
    pub(crate) fn write_styles(&mut self) -> Result<()> {
        writeln!(self, r##"<defs>
<style>
    .rgn {{ stroke: #111827; fill-opacity: 0.85; }}
    .lbl {{ font-family: sans-serif; text-anchor: middle; fill: #111827; }}
    .notice {{ font-family: sans-serif; text-anchor: middle; fill: #6b7280; }}
</style>
</defs>"##)?;
        Ok(())
    }

    /// Write the closing </svg> tag.
    pub(crate) fn write_footer(&mut self) -> Result<()> {
        writeln!(self, "</svg>")?;
        Ok(())
    }
}

/// Build a compact SVG path string for a MultiPolygon (exteriors + holes).
pub(crate) fn multipolygon_to_path(
    shape: &MultiPolygon<f64>,
    project: &impl Fn(&Coord<f64>) -> (f64, f64),
) -> String {
    let mut out = String::new();

    for polygon in &shape.0 {
        out.push_str(&ring_to_path(polygon.exterior(), project));
        for interior in polygon.interiors() {
            out.push_str(&ring_to_path(interior, project));
        }
    }

    out
}

/// Build a compact SVG path string for a LineString (ring).
fn ring_to_path(ring: &LineString<f64>, project: &impl Fn(&Coord<f64>) -> (f64, f64)) -> String {
    let mut out = String::new();

    let mut coords = ring.coords_iter().map(|coord| project(&coord));
    if let Some((x, y)) = coords.next() {
        out.push_str(&format!(" M{x:.3},{y:.3}"));
        for (x, y) in coords {
            out.push_str(&format!(" L{x:.3},{y:.3}"));
        }
        out.push('Z');
    }

    out
}
