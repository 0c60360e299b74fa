// src/layout.rs

use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::DependencyGraph;

/// Closest distance two nodes are treated as having
const MIN_DISTANCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    pub iterations: usize,
    pub seed: u64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            iterations: 50,
            seed: 42,
        }
    }
}

/// Node positions in `[-1, 1]²`, indexed like the graph's nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub positions: Vec<Point>,
}

impl Layout {
    /// Fruchterman-Reingold spring layout.
    ///
    /// Every pair of nodes repels, nodes joined by an edge attract, and the
    /// step size cools linearly to zero over `options.iterations` rounds. The
    /// starting positions come from a seeded RNG, so equal inputs give equal
    /// layouts.
    pub fn spring(graph: &DependencyGraph, options: &LayoutOptions, bar: &ProgressBar) -> Self {
        let n = graph.nodes.len();
        if n <= 1 {
            bar.finish_and_clear();
            return Self {
                positions: vec![Point::ORIGIN; n],
            };
        }

        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut positions = (0..n)
            .map(|_| Point {
                x: rng.gen_range(0.0f32..1.0f32),
                y: rng.gen_range(0.0f32..1.0f32),
            })
            .collect::<Vec<_>>();

        let adjacency = graph.adjacency();
        let k = (1.0 / n as f32).sqrt();
        let mut temperature = 0.1f32;
        let cooling = temperature / (options.iterations + 1) as f32;

        bar.set_length(options.iterations as u64);
        bar.set_message("Computing layout");

        for _ in 0..options.iterations {
            let mut displacement = vec![Point::ORIGIN; n];

            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let delta = Point {
                        x: positions[i].x - positions[j].x,
                        y: positions[i].y - positions[j].y,
                    };
                    let distance = delta.length().max(MIN_DISTANCE);
                    let attraction = if adjacency[i].contains(&j) {
                        distance / k
                    } else {
                        0.0
                    };
                    // Scaled by delta once more, so this is k²/d repulsion
                    // against d²/k attraction along the direction of delta.
                    let force = k * k / (distance * distance) - attraction;
                    displacement[i].x += delta.x * force;
                    displacement[i].y += delta.y * force;
                }
            }

            for (position, displacement) in positions.iter_mut().zip(&displacement) {
                let length = displacement.length().max(MIN_DISTANCE);
                position.x += displacement.x * temperature / length;
                position.y += displacement.y * temperature / length;
            }

            temperature -= cooling;
            bar.inc(1);
        }
        bar.finish_with_message("Layout complete");

        Self {
            positions: normalize(positions),
        }
    }
}

/// Centers the positions on the origin and scales the largest coordinate to 1
fn normalize(mut positions: Vec<Point>) -> Vec<Point> {
    let n = positions.len() as f32;
    let mean_x = positions.iter().map(|p| p.x).sum::<f32>() / n;
    let mean_y = positions.iter().map(|p| p.y).sum::<f32>() / n;

    let mut extent = 0.0f32;
    for p in &mut positions {
        p.x -= mean_x;
        p.y -= mean_y;
        extent = extent.max(p.x.abs()).max(p.y.abs());
    }

    if extent > 0.0 {
        for p in &mut positions {
            p.x /= extent;
            p.y /= extent;
        }
    }
    positions
}
