//! Highlight map of the region.
//!
//! Polygons are projected equirectangularly with the `1/cos(latitude)`
//! aspect correction used for plain lon/lat data, rasterized with tiny-skia,
//! and cropped to the drawn content.

use geo::{LineString, MultiPolygon, Rect};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform,
};

use crate::region::RegionMap;

/// Pixels kept around the content so outlines are not clipped.
const MARGIN: f32 = 1.0;
/// Width of the outline drawn in the highlight colour, so municipalities
/// smaller than a pixel still show up.
const HIGHLIGHT_OUTLINE: f32 = 1.0;

/// Colours and line widths of the highlight map. Colours are straight RGBA.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MapStyle {
    /// Length in pixels of the longer side of the drawn content.
    pub resolution: u32,
    pub background: [u8; 4],
    pub boundary_color: [u8; 4],
    pub boundary_width: f32,
    pub land_fill: [u8; 4],
    pub land_outline: [u8; 4],
    pub land_outline_width: f32,
    pub visited_fill: [u8; 4],
    pub current_fill: [u8; 4],
}

impl Default for MapStyle {
    fn default() -> Self {
        // Line widths are 0.2pt and 0.3pt at 200 dpi.
        Self {
            resolution: 1200,
            background: [255, 255, 255, 255],
            boundary_color: [128, 128, 128, 255],
            boundary_width: 0.2 * 200.0 / 72.0,
            land_fill: [255, 255, 153, 255],
            land_outline: [0, 0, 0, 255],
            land_outline_width: 0.3 * 200.0 / 72.0,
            visited_fill: [255, 165, 0, 255],
            current_fill: [255, 0, 0, 255],
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MapError {
    #[error("region has no drawable polygons")]
    EmptyRegion,
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
    #[error("failed to encode map: {0}")]
    Encode(String),
}

/// A rendered map and the names that could not be highlighted.
#[derive(Debug, Clone)]
pub struct MapRender {
    pub pixmap: Pixmap,
    /// Current or visited names without a matching polygon, in draw order.
    pub missing: Vec<String>,
}

impl MapRender {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha RGBA of one pixel, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixmap.pixel(x, y).map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, MapError> {
        self.pixmap
            .encode_png()
            .map_err(|error| MapError::Encode(error.to_string()))
    }
}

/// Maps lon/lat degrees to canvas pixels.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    min_lon: f64,
    max_lat: f64,
    x_scale: f64,
    y_scale: f64,
    width: u32,
    height: u32,
}

impl Projection {
    pub fn fit(bounds: Rect<f64>, resolution: u32) -> Self {
        let mid_lat = (bounds.min().y + bounds.max().y) / 2.0;
        let aspect = 1.0 / mid_lat.to_radians().cos().max(f64::EPSILON);

        let span_x = bounds.width();
        let span_y = bounds.height() * aspect;
        let longest = span_x.max(span_y).max(f64::EPSILON);
        let scale = f64::from(resolution.max(1)) / longest;

        let margin = f64::from(MARGIN);
        let width = (span_x * scale + 2.0 * margin).ceil().max(1.0) as u32;
        let height = (span_y * scale + 2.0 * margin).ceil().max(1.0) as u32;

        Self {
            min_lon: bounds.min().x,
            max_lat: bounds.max().y,
            x_scale: scale,
            y_scale: scale * aspect,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn project(&self, lon: f64, lat: f64) -> (f32, f32) {
        let margin = f64::from(MARGIN);
        let x = (lon - self.min_lon) * self.x_scale + margin;
        let y = (self.max_lat - lat) * self.y_scale + margin;
        (x as f32, y as f32)
    }
}

/// Draws every region polygon and highlights `visited` in orange and
/// `current` in red.
///
/// Layers go down in this order, later ones covering earlier ones: grey
/// boundaries, yellow land with black outlines, visited fills, current fill.
/// A name with no polygon is skipped and reported in [`MapRender::missing`].
///
/// # Errors
/// * Returns [`MapError::EmptyRegion`] if the region has nothing to draw.
/// * Returns [`MapError::Canvas`] if the canvas cannot be allocated.
pub fn render_map(
    region: &RegionMap,
    current: Option<&str>,
    visited: &[String],
    style: &MapStyle,
) -> Result<MapRender, MapError> {
    let bounds = region.bounds().ok_or(MapError::EmptyRegion)?;
    let projection = Projection::fit(bounds, style.resolution);

    let mut pixmap = Pixmap::new(projection.width(), projection.height()).ok_or(MapError::Canvas {
        width: projection.width(),
        height: projection.height(),
    })?;
    pixmap.fill(color(style.background));

    let paths: Vec<Path> = region
        .polygons()
        .iter()
        .filter_map(|polygon| polygon_path(&polygon.geometry, &projection))
        .collect();

    let boundary = stroke_paint(style.boundary_color);
    let boundary_stroke = thin_stroke(style.boundary_width);
    for path in &paths {
        pixmap.stroke_path(path, &boundary, &boundary_stroke, Transform::identity(), None);
    }

    let land = fill_paint(style.land_fill);
    let outline = stroke_paint(style.land_outline);
    let outline_stroke = thin_stroke(style.land_outline_width);
    for path in &paths {
        pixmap.fill_path(path, &land, FillRule::EvenOdd, Transform::identity(), None);
        pixmap.stroke_path(path, &outline, &outline_stroke, Transform::identity(), None);
    }

    let mut missing = Vec::new();

    for name in visited {
        if !fill_named(&mut pixmap, region, name, style.visited_fill, &projection) {
            tracing::warn!(name = name.trim(), "visited city has no boundary polygon");
            missing.push(name.clone());
        }
    }

    if let Some(name) = current {
        if !fill_named(&mut pixmap, region, name, style.current_fill, &projection) {
            tracing::warn!(name = name.trim(), "current city has no boundary polygon");
            missing.push(name.to_string());
        }
    }

    Ok(MapRender { pixmap, missing })
}

/// Fills and outlines every polygon named `name` in `fill`. Returns `false`
/// when none matched.
fn fill_named(
    pixmap: &mut Pixmap,
    region: &RegionMap,
    name: &str,
    fill: [u8; 4],
    projection: &Projection,
) -> bool {
    let paint = stroke_paint(fill);
    let outline = thin_stroke(HIGHLIGHT_OUTLINE);
    let mut matched = false;

    for polygon in region.polygons_named(name) {
        matched = true;
        if let Some(path) = polygon_path(&polygon.geometry, projection) {
            pixmap.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
            pixmap.stroke_path(&path, &paint, &outline, Transform::identity(), None);
        }
    }

    matched
}

fn polygon_path(geometry: &MultiPolygon<f64>, projection: &Projection) -> Option<Path> {
    let mut builder = PathBuilder::new();

    for polygon in &geometry.0 {
        push_ring(&mut builder, polygon.exterior(), projection);
        for interior in polygon.interiors() {
            push_ring(&mut builder, interior, projection);
        }
    }

    builder.finish()
}

fn push_ring(builder: &mut PathBuilder, ring: &LineString<f64>, projection: &Projection) {
    let mut points = ring.coords().map(|coord| projection.project(coord.x, coord.y));

    let Some((x, y)) = points.next() else {
        return;
    };
    builder.move_to(x, y);
    for (x, y) in points {
        builder.line_to(x, y);
    }
    builder.close();
}

fn color(rgba: [u8; 4]) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn fill_paint(rgba: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color(rgba));
    paint.anti_alias = false;
    paint
}

fn stroke_paint(rgba: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color(rgba));
    paint.anti_alias = true;
    paint
}

fn thin_stroke(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}
