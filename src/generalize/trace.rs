//! Boundary tracing of a binary raster into closed lattice paths.
//!
//! Follows the decomposition of potrace: scan for a set pixel, walk the
//! boundary keeping set pixels on the left, then invert everything the path
//! encloses so holes show up as set pixels on later scans. Ambiguous diagonal
//! configurations turn towards the locally less common color ("minority"
//! policy), which keeps paths from crossing.

use geo::Coord;

/// One segment of a traced outline, in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Coord<f64>),
    LineTo(Coord<f64>),
    /// Cubic Bézier segment; the tracer never emits curves but the path
    /// parser keeps their end point.
    CurveTo { c1: Coord<f64>, c2: Coord<f64>, to: Coord<f64> },
}

/// Bit-per-pixel working copy; out-of-range reads are unset.
#[derive(Clone)]
struct Bitmap {
    width: i64,
    height: i64,
    bits: Vec<bool>,
}

impl Bitmap {
    fn from_samples(samples: &ndarray::Array2<u8>) -> Self {
        let (rows, cols) = samples.dim();
        Self {
            width: cols as i64,
            height: rows as i64,
            bits: samples.iter().map(|&v| v > 127).collect(),
        }
    }

    fn at(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }

    fn flip(&mut self, x: i64, y: i64) {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            let i = (y * self.width + x) as usize;
            self.bits[i] = !self.bits[i];
        }
    }

    /// First set pixel at or after linear position `from`.
    fn find_next(&self, from: usize) -> Option<usize> {
        self.bits[from..].iter().position(|&bit| bit).map(|offset| from + offset)
    }

    /// Majority color in growing squares around lattice point `(x, y)`.
    fn majority(&self, x: i64, y: i64) -> bool {
        for i in 2..5 {
            let mut ct = 0;
            for a in -i + 1..=i - 1 {
                ct += if self.at(x + a, y + i - 1) { 1 } else { -1 };
                ct += if self.at(x + i - 1, y + a - 1) { 1 } else { -1 };
                ct += if self.at(x + a - 1, y - i) { 1 } else { -1 };
                ct += if self.at(x - i, y + a) { 1 } else { -1 };
            }
            if ct > 0 {
                return true;
            } else if ct < 0 {
                return false;
            }
        }
        false
    }
}

struct LatticePath {
    points: Vec<(i64, i64)>,
    area: i64,
    max_x: i64,
}

/// Walk the boundary starting at the top-left corner of pixel `(x0, y0)`.
fn find_path(bitmap: &Bitmap, x0: i64, y0: i64) -> LatticePath {
    let (mut x, mut y) = (x0, y0);
    let (mut dir_x, mut dir_y) = (0i64, 1i64);
    let mut path = LatticePath { points: Vec::new(), area: 0, max_x: x0 };

    loop {
        path.points.push((x, y));
        path.max_x = path.max_x.max(x);

        x += dir_x;
        y += dir_y;
        path.area -= x * dir_y;

        if x == x0 && y == y0 {
            break;
        }

        let left = bitmap.at(x + (dir_x + dir_y - 1) / 2, y + (dir_y - dir_x - 1) / 2);
        let right = bitmap.at(x + (dir_x - dir_y - 1) / 2, y + (dir_y + dir_x - 1) / 2);

        if right && !left {
            // Diagonal ambiguity: turn towards the minority color.
            if bitmap.majority(x, y) {
                (dir_x, dir_y) = (dir_y, -dir_x);
            } else {
                (dir_x, dir_y) = (-dir_y, dir_x);
            }
        } else if right {
            (dir_x, dir_y) = (-dir_y, dir_x);
        } else if !left {
            (dir_x, dir_y) = (dir_y, -dir_x);
        }
    }
    path
}

/// Invert every pixel enclosed by `path`, row by row up to its right edge.
fn xor_path(bitmap: &mut Bitmap, path: &LatticePath) {
    let mut y1 = path.points[0].1;
    for &(x, y) in &path.points[1..] {
        if y != y1 {
            let min_y = y1.min(y);
            for j in x..path.max_x {
                bitmap.flip(j, min_y);
            }
            y1 = y;
        }
    }
}

/// Lattice points where the path changes direction.
fn corners(points: &[(i64, i64)]) -> Vec<(i64, i64)> {
    let n = points.len();
    (0..n)
        .filter(|&i| {
            let (px, py) = points[(i + n - 1) % n];
            let (cx, cy) = points[i];
            let (nx, ny) = points[(i + 1) % n];
            (cx - px, cy - py) != (nx - cx, ny - cy)
        })
        .map(|i| points[i])
        .collect()
}

/// Trace every outline of a binarized raster (samples above 127 are set).
///
/// Outer boundaries and hole boundaries both come back as closed paths of
/// horizontal and vertical segments on the pixel lattice, each starting with a
/// `MoveTo`. Paths enclosing `turd_size` pixels or fewer are discarded.
pub fn trace(raster: &crate::raster::Raster, turd_size: u32) -> Vec<PathCommand> {
    let mut bitmap = Bitmap::from_samples(raster.samples());
    let mut commands = Vec::new();
    let mut cursor = 0;

    while let Some(index) = bitmap.find_next(cursor) {
        cursor = index;
        let (x, y) = (index as i64 % bitmap.width, index as i64 / bitmap.width);
        let path = find_path(&bitmap, x, y);
        xor_path(&mut bitmap, &path);

        if path.area <= turd_size as i64 {
            continue;
        }
        let mut vertices = corners(&path.points).into_iter();
        if let Some((sx, sy)) = vertices.next() {
            commands.push(PathCommand::MoveTo(Coord { x: sx as f64, y: sy as f64 }));
            commands.extend(vertices.map(|(cx, cy)| PathCommand::LineTo(Coord { x: cx as f64, y: cy as f64 })));
        }
    }
    commands
}
