// Grid placement for dashboard panels
use serde::{Deserialize, Serialize};

/// Number of columns in the dashboard grid.
pub const GRID_COLS: i32 = 12;
/// Default size for a freshly added panel.
pub const DEFAULT_PANEL_W: i32 = 6;
pub const DEFAULT_PANEL_H: i32 = 4;

/// Cell-coordinate rectangle of one panel in the dashboard grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Open-interval rectangle overlap test. Rectangles that merely share an
/// edge do not overlap.
pub fn overlaps(a: &GridPos, b: &GridPos) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Find a free `w` x `h` rectangle among the existing panel rectangles.
///
/// Scans row-major (top-most, then left-most) up to the bottom edge of the
/// existing content and returns the first non-overlapping candidate. When
/// every row is taken, the new panel goes below all existing content at
/// column 0. Deterministic: the same panel set always yields the same
/// rectangle.
pub fn allocate(existing: &[GridPos], cols: i32, w: i32, h: i32) -> GridPos {
    let max_y = existing.iter().map(|p| p.y + p.h).max().unwrap_or(0);

    for y in 0..=max_y {
        for x in 0..=(cols - w) {
            let candidate = GridPos { x, y, w, h };
            if !existing.iter().any(|p| overlaps(&candidate, p)) {
                return candidate;
            }
        }
    }

    GridPos { x: 0, y: max_y, w, h }
}
