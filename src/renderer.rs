// src/renderer.rs

use std::{borrow::Cow, fs, path::Path};

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut, draw_polygon_mut,
    draw_text_mut,
};
use imageproc::point::Point as PixelPoint;
use indicatif::ProgressBar;
use log::{debug, info};
use palette::{FromColor, Lch, LinSrgb, Srgb};
use rusttype::{point, Font, Scale};

use crate::cli::{Args, LabelMode};
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::layout::{Layout, LayoutOptions, Point};
use crate::model::CommitRecord;

const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const OUTLINE: Rgb<u8> = Rgb([60, 72, 88]);
const EDGE: Rgb<u8> = Rgb([90, 90, 100]);
const TEXT: Rgb<u8> = Rgb([20, 20, 28]);

const ARROW_LENGTH: f32 = 14.0;
const MIN_NODE_RADIUS: f32 = 4.0;
const ARROW_HALF_WIDTH: f32 = 6.0;
const LABEL_GAP: f32 = 4.0;
const MAX_LABEL_CHARS: usize = 40;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub node_radius: u32,
    pub font_size: f32,
    pub labels: LabelMode,
    pub layout: LayoutOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            node_radius: 28,
            font_size: 16.0,
            labels: LabelMode::Both,
            layout: LayoutOptions::default(),
        }
    }
}

impl From<&Args> for RenderOptions {
    fn from(args: &Args) -> Self {
        Self {
            width: args.width,
            height: args.height,
            labels: args.labels,
            layout: LayoutOptions {
                iterations: args.iterations,
                seed: args.seed,
            },
            ..Self::default()
        }
    }
}

/// Lays out the commits as an older-to-newer chain and writes the drawing to
/// `output`, in the format implied by its extension (PNG when it has none).
pub fn render_chain(commits: &[CommitRecord], output: &Path, options: &RenderOptions) -> Result<()> {
    let graph = DependencyGraph::chain(commits);
    if graph.is_empty() {
        return Err(Error::EmptyGraph);
    }
    debug!(
        "Rendering {} nodes and {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );
    debug!(
        "Chain: {}",
        graph
            .nodes
            .iter()
            .rev()
            .map(|node| node.hash.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    let bar = ProgressBar::new(options.layout.iterations as u64);
    let layout = Layout::spring(&graph, &options.layout, &bar);

    let font = load_font()?;
    let image = draw(&graph, &layout, options, &font);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    // No extension means PNG, anything else is left to the extension
    let saved = match output.extension() {
        Some(_) => image.save(output),
        None => image.save_with_format(output, ImageFormat::Png),
    };
    saved.map_err(|source| Error::Image {
        path: output.to_path_buf(),
        source,
    })?;

    info!("Dependency graph saved to: {}", output.display());
    Ok(())
}

pub fn load_font() -> Result<Font<'static>> {
    Font::try_from_bytes(FONT_BYTES).ok_or(Error::Font)
}

/// Draws edges first, then nodes on top of them, then labels on top of both.
pub fn draw(
    graph: &DependencyGraph,
    layout: &Layout,
    options: &RenderOptions,
    font: &Font,
) -> RgbImage {
    let mut image = RgbImage::from_pixel(options.width, options.height, BACKGROUND);
    let centers = project_all(layout, options);
    let radius = fitted_radius(&centers, options.node_radius as f32);

    draw_edges(&mut image, graph, &centers, radius);

    let count = graph.nodes.len();
    for (i, &(x, y)) in centers.iter().enumerate() {
        let center = (x.round() as i32, y.round() as i32);
        draw_filled_circle_mut(&mut image, center, radius.round() as i32, node_color(i, count));
        draw_hollow_circle_mut(&mut image, center, radius.round() as i32, OUTLINE);
    }

    let scale = Scale::uniform(options.font_size);
    for (node, &(x, y)) in graph.nodes.iter().zip(&centers) {
        if options.labels.shows_hash() {
            let top = y - radius - LABEL_GAP - options.font_size;
            draw_label(&mut image, font, scale, &node.short_hash, x, top);
        }
        if options.labels.shows_message() && !node.label.is_empty() {
            let top = y + radius + LABEL_GAP;
            draw_label(&mut image, font, scale, &truncate(&node.label, MAX_LABEL_CHARS), x, top);
        }
    }

    image
}

/// Maps a layout position in `[-1, 1]²` to pixel coordinates, keeping a
/// margin wide enough for the node and its labels.
pub fn project(p: Point, options: &RenderOptions) -> (f32, f32) {
    let radius = options.node_radius as f32;
    let width = options.width as f32;
    let height = options.height as f32;

    let margin_x = (2.0 * radius).max(width * 0.12);
    let margin_y = radius + 2.0 * (options.font_size + LABEL_GAP);
    let span_x = (width - 2.0 * margin_x).max(0.0);
    let span_y = (height - 2.0 * margin_y).max(0.0);

    (
        margin_x.min(width / 2.0) + (p.x + 1.0) / 2.0 * span_x,
        margin_y.min(height / 2.0) + (p.y + 1.0) / 2.0 * span_y,
    )
}

fn project_all(layout: &Layout, options: &RenderOptions) -> Vec<(f32, f32)> {
    layout.positions.iter().map(|&p| project(p, options)).collect()
}

/// Shrinks the circles so that no two of them overlap, down to
/// `MIN_NODE_RADIUS`.
fn fitted_radius(centers: &[(f32, f32)], max_radius: f32) -> f32 {
    let closest = centers
        .iter()
        .enumerate()
        .flat_map(|(i, a)| {
            centers[i + 1..]
                .iter()
                .map(move |b| (b.0 - a.0).hypot(b.1 - a.1))
        })
        .fold(f32::INFINITY, f32::min);

    (closest * 0.4).clamp(MIN_NODE_RADIUS, max_radius.max(MIN_NODE_RADIUS))
}

fn draw_edges(image: &mut RgbImage, graph: &DependencyGraph, centers: &[(f32, f32)], radius: f32) {
    for edge in &graph.edges {
        draw_arrow(image, centers[edge.from], centers[edge.to], radius);
    }
}

/// Centre-to-centre line with the arrowhead tip on the target's outline.
/// The nodes are drawn afterwards and cover the ends of the line.
fn draw_arrow(image: &mut RgbImage, from: (f32, f32), to: (f32, f32), radius: f32) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = dx.hypot(dy);
    let (ux, uy) = if length > f32::EPSILON {
        (dx / length, dy / length)
    } else {
        (0.0, 0.0)
    };
    // Three parallel strokes for a 2px line
    for offset in [-0.5f32, 0.0, 0.5] {
        let (ox, oy) = (-uy * offset, ux * offset);
        draw_line_segment_mut(image, (from.0 + ox, from.1 + oy), (to.0 + ox, to.1 + oy), EDGE);
    }

    if length <= f32::EPSILON {
        debug!("Edge between nodes at the same position has no direction");
        return;
    }

    // Nodes that nearly touch get the tip halfway between them
    let back = radius.min(length / 2.0);
    let tip = (to.0 - ux * back, to.1 - uy * back);
    let base = (tip.0 - ux * ARROW_LENGTH, tip.1 - uy * ARROW_LENGTH);

    let head = [
        PixelPoint::new(tip.0.round() as i32, tip.1.round() as i32),
        PixelPoint::new(
            (base.0 - uy * ARROW_HALF_WIDTH).round() as i32,
            (base.1 + ux * ARROW_HALF_WIDTH).round() as i32,
        ),
        PixelPoint::new(
            (base.0 + uy * ARROW_HALF_WIDTH).round() as i32,
            (base.1 - ux * ARROW_HALF_WIDTH).round() as i32,
        ),
    ];
    draw_polygon_mut(image, &head, EDGE);
}

fn draw_label(image: &mut RgbImage, font: &Font, scale: Scale, text: &str, center_x: f32, top: f32) {
    let x = center_x - text_width(font, scale, text) / 2.0;
    draw_text_mut(image, TEXT, x.round() as i32, top.round() as i32, scale, font, text);
}

fn text_width(font: &Font, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .filter_map(|glyph| glyph.pixel_bounding_box())
        .map(|bb| bb.max.x)
        .max()
        .unwrap_or(0) as f32
}

fn truncate(label: &str, max_chars: usize) -> Cow<'_, str> {
    if label.chars().count() <= max_chars {
        return Cow::Borrowed(label);
    }
    let mut short = label.chars().take(max_chars - 1).collect::<String>();
    short.push('…');
    Cow::Owned(short)
}

/// Cold blue for the oldest commit through to orange for the newest.
/// Node 0 is the newest, matching the newest-first commit list.
pub fn node_color(index: usize, count: usize) -> Rgb<u8> {
    let age = if count <= 1 {
        1.0
    } else {
        1.0 - index as f32 / (count - 1) as f32
    };

    let lch_colors = [
        Lch::new(50.0f32, 45.0f32, 260.0f32), // Blue
        Lch::new(80.0f32, 30.0f32, 230.0f32), // Sky blue
        Lch::new(75.0f32, 75.0f32, 55.0f32),  // Orange
    ];
    let gradient_stops: [LinSrgb<f32>; 3] = lch_colors.map(LinSrgb::from_color);

    let scaled_pos = age * (gradient_stops.len() - 1) as f32;
    let idx1 = (scaled_pos.floor() as usize).min(gradient_stops.len() - 1);
    let idx2 = (idx1 + 1).min(gradient_stops.len() - 1);
    let t = scaled_pos - idx1 as f32;

    let c1 = gradient_stops[idx1];
    let c2 = gradient_stops[idx2];
    let mixed = LinSrgb::new(
        c1.red + (c2.red - c1.red) * t,
        c1.green + (c2.green - c1.green) * t,
        c1.blue + (c2.blue - c1.blue) * t,
    );

    let srgb: Srgb<f32> = Srgb::from_linear(mixed);
    let (r, g, b) = srgb.into_components();
    let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb([to_u8(r), to_u8(g), to_u8(b)])
}

/// Counts the chain edges of an image drawn by [`render_chain`] that show
/// edge ink somewhere between their two circles. The layout is recomputed
/// from the node count and `options`, which is all it depends on.
#[cfg(test)]
pub fn visible_edges(image: &RgbImage, node_count: usize, options: &RenderOptions) -> usize {
    let commits = (0..node_count)
        .map(|i| CommitRecord::new(format!("h{i}"), ""))
        .collect::<Vec<_>>();
    let graph = DependencyGraph::chain(&commits);
    let layout = Layout::spring(&graph, &options.layout, &ProgressBar::hidden());
    let centers = project_all(&layout, options);
    let radius = fitted_radius(&centers, options.node_radius as f32);

    graph
        .edges
        .iter()
        .filter(|edge| {
            let (a, b) = (centers[edge.from], centers[edge.to]);
            let outside = |p: (f32, f32), c: (f32, f32)| (p.0 - c.0).hypot(p.1 - c.1) > radius + 2.0;
            (1..100)
                .map(|step| step as f32 / 100.0)
                .map(|t| (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t))
                .filter(|&p| outside(p, a) && outside(p, b))
                .any(|p| has_color_near(image, p, EDGE))
        })
        .count()
}

#[cfg(test)]
fn has_color_near(image: &RgbImage, (x, y): (f32, f32), color: Rgb<u8>) -> bool {
    let (x, y) = (x.round() as i64, y.round() as i64);
    (y - 1..=y + 1)
        .flat_map(|py| (x - 1..=x + 1).map(move |px| (px, py)))
        .filter(|&(px, py)| {
            px >= 0 && py >= 0 && (px as u32) < image.width() && (py as u32) < image.height()
        })
        .any(|(px, py)| *image.get_pixel(px as u32, py as u32) == color)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn commits(n: usize) -> Vec<CommitRecord> {
        (0..n)
            .map(|i| CommitRecord::new(format!("hash{i}"), format!("Commit {i}")))
            .collect()
    }

    fn small_options() -> RenderOptions {
        RenderOptions {
            width: 400,
            height: 300,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn writes_png() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("output_graph.png");
        render_chain(&commits(2), &output, &small_options()).unwrap();

        let image = image::open(&output).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (400, 300));
        assert_eq!(visible_edges(&image, 2, &small_options()), 1);
    }

    #[test]
    fn no_extension_writes_png() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("dependency_graph");
        render_chain(&commits(2), &output, &small_options()).unwrap();

        let bytes = fs::read(&output).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn every_edge_is_drawn_for_long_histories() {
        let options = RenderOptions::default();
        let graph = DependencyGraph::chain(&commits(20));
        let layout = Layout::spring(&graph, &options.layout, &ProgressBar::hidden());
        let centers = project_all(&layout, &options);
        let radius = fitted_radius(&centers, options.node_radius as f32);

        let mut image = RgbImage::from_pixel(options.width, options.height, BACKGROUND);
        draw_edges(&mut image, &graph, &centers, radius);
        for edge in &graph.edges {
            let (a, b) = (centers[edge.from], centers[edge.to]);
            let middle = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
            assert!(has_color_near(&image, middle, EDGE), "edge {edge:?}");
        }

        let full = draw(&graph, &layout, &options, &load_font().unwrap());
        assert!(visible_edges(&full, 20, &options) > 0);
    }

    #[test]
    fn circles_do_not_overlap() {
        let options = RenderOptions::default();
        let graph = DependencyGraph::chain(&commits(20));
        let layout = Layout::spring(&graph, &options.layout, &ProgressBar::hidden());
        let centers = project_all(&layout, &options);
        let radius = fitted_radius(&centers, options.node_radius as f32);

        assert!(radius <= options.node_radius as f32);
        for (i, a) in centers.iter().enumerate() {
            for b in &centers[i + 1..] {
                assert!((b.0 - a.0).hypot(b.1 - a.1) >= 2.0 * radius);
            }
        }
    }

    #[test]
    fn fitted_radius_bounds() {
        assert_eq!(fitted_radius(&[(10.0, 10.0)], 28.0), 28.0);
        assert_eq!(fitted_radius(&[(0.0, 0.0), (100.0, 0.0)], 28.0), 28.0);
        assert_eq!(fitted_radius(&[(0.0, 0.0), (30.0, 0.0)], 28.0), 12.0);
        assert_eq!(fitted_radius(&[(0.0, 0.0), (1.0, 0.0)], 28.0), MIN_NODE_RADIUS);
    }

    #[test]
    fn touching_nodes_still_get_an_arrow() {
        let mut image = RgbImage::from_pixel(100, 100, BACKGROUND);
        draw_arrow(&mut image, (40.0, 50.0), (60.0, 50.0), 28.0);
        assert_eq!(*image.get_pixel(50, 50), EDGE);

        let mut image = RgbImage::from_pixel(100, 100, BACKGROUND);
        draw_arrow(&mut image, (50.0, 50.0), (50.0, 50.0), 28.0);
        assert_eq!(*image.get_pixel(50, 50), EDGE);
    }

    #[test]
    fn single_commit() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("one.png");
        render_chain(&commits(1), &output, &small_options()).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn empty_list_is_rejected() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("none.png");
        let result = render_chain(&[], &output, &small_options());
        assert!(matches!(result, Err(Error::EmptyGraph)));
        assert!(!output.exists());
    }

    #[test]
    fn overwrites_and_creates_directories() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("nested/deeper/graph.png");
        render_chain(&commits(3), &output, &small_options()).unwrap();
        fs::write(&output, b"stale").unwrap();
        render_chain(&commits(3), &output, &small_options()).unwrap();
        assert!(image::open(&output).is_ok());
    }

    #[test]
    fn unknown_extension() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("graph.notanimage");
        let result = render_chain(&commits(2), &output, &small_options());
        assert!(matches!(result, Err(Error::Image { .. })), "{result:?}");
    }

    #[test]
    fn nodes_are_drawn_at_their_positions() {
        let options = small_options();
        let graph = DependencyGraph::chain(&commits(2));
        let layout = Layout::spring(&graph, &options.layout, &ProgressBar::hidden());
        let image = draw(&graph, &layout, &options, &load_font().unwrap());

        for (i, &p) in layout.positions.iter().enumerate() {
            let (x, y) = project(p, &options);
            let pixel = *image.get_pixel(x.round() as u32, y.round() as u32);
            assert_eq!(pixel, node_color(i, 2), "node {i}");
        }
    }

    #[test]
    fn single_node_is_centered() {
        let options = small_options();
        let graph = DependencyGraph::chain(&commits(1));
        let layout = Layout::spring(&graph, &options.layout, &ProgressBar::hidden());
        let image = draw(&graph, &layout, &options, &load_font().unwrap());
        assert_eq!(*image.get_pixel(200, 150), node_color(0, 1));
    }

    #[test]
    fn labels_leave_ink() {
        let options = RenderOptions {
            labels: LabelMode::Message,
            ..small_options()
        };
        let graph = DependencyGraph::chain(&commits(1));
        let layout = Layout::spring(&graph, &options.layout, &ProgressBar::hidden());
        let image = draw(&graph, &layout, &options, &load_font().unwrap());

        let (x, y) = project(layout.positions[0], &options);
        let top = (y + options.node_radius as f32 + LABEL_GAP) as u32;
        let inked = (top..top + options.font_size as u32)
            .flat_map(|py| ((x as u32 - 40)..(x as u32 + 40)).map(move |px| (px, py)))
            .any(|(px, py)| *image.get_pixel(px, py) != BACKGROUND);
        assert!(inked);
    }

    #[test]
    fn project_keeps_margins() {
        let options = small_options();
        let (x0, y0) = project(Point { x: -1.0, y: -1.0 }, &options);
        let (x1, y1) = project(Point { x: 1.0, y: 1.0 }, &options);
        let radius = options.node_radius as f32;
        assert!(x0 >= radius && y0 >= radius);
        assert!(x1 <= 400.0 - radius && y1 <= 300.0 - radius);
        assert_eq!(project(Point::ORIGIN, &options), (200.0, 150.0));
    }

    #[test]
    fn gradient_runs_from_oldest_to_newest() {
        assert_ne!(node_color(0, 3), node_color(2, 3));
        assert_eq!(node_color(0, 1), node_color(0, 5));
        assert_ne!(node_color(0, 3), OUTLINE);
    }

    #[test]
    fn long_labels_are_truncated() {
        assert_eq!(truncate("short", 10), "short");
        let long = "x".repeat(50);
        let short = truncate(&long, 10);
        assert_eq!(short.chars().count(), 10);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn text_has_width() {
        let font = load_font().unwrap();
        let scale = Scale::uniform(16.0);
        assert!(text_width(&font, scale, "Initial commit") > text_width(&font, scale, "I"));
        assert_eq!(text_width(&font, scale, ""), 0.0);
    }
}
