/// Axis-aligned rectangle bin packing with a best-area-fit heuristic

/// Integer rectangle in sheet coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x && other.y >= self.y && other.right() <= self.right() && other.bottom() <= self.bottom()
    }
}

/// Rectangle packer maintaining a set of candidate free regions within a
/// fixed-size sheet. The free rectangles may overlap each other but never a
/// committed placement, so every placement this packer returns is disjoint
/// from all earlier ones and lies within the sheet.
pub struct MaxRectsPacker {
    sheet_width: u32,
    sheet_height: u32,
    allow_rotation: bool,
    free_rects: Vec<Rect>,
    used_area: u64,
}

impl MaxRectsPacker {
    /// Creates a packer whose free set is the whole sheet.
    pub fn new(sheet_width: u32, sheet_height: u32, allow_rotation: bool) -> Self {
        Self {
            sheet_width,
            sheet_height,
            allow_rotation,
            free_rects: vec![Rect { x: 0, y: 0, w: sheet_width, h: sheet_height }],
            used_area: 0,
        }
    }

    /// Rotation is recorded for forward compatibility only; `insert` always
    /// places rectangles unrotated.
    pub fn allows_rotation(&self) -> bool {
        self.allow_rotation
    }

    /// Fraction of the sheet area committed to placements.
    pub fn occupancy(&self) -> f32 {
        let total = self.sheet_width as u64 * self.sheet_height as u64;
        if total == 0 {
            return 0.0;
        }
        self.used_area as f32 / total as f32
    }

    /// Finds and commits a position for a `width` x `height` rectangle, or
    /// returns `None` when no free region can hold it. The sheet never grows;
    /// exhaustion is the caller's hard error.
    pub fn insert(&mut self, width: u32, height: u32) -> Option<Rect> {
        let chosen = self.find_best_area_fit(width, height)?;
        let placed = Rect { x: chosen.x, y: chosen.y, w: width, h: height };

        // Split every free rectangle the placement intersects into its
        // residual to the right (spanning the old rectangle's height) and its
        // residual below (spanning the old rectangle's width).
        let mut split = Vec::with_capacity(self.free_rects.len() + 2);
        for free in &self.free_rects {
            if !free.intersects(&placed) {
                split.push(*free);
                continue;
            }
            if placed.right() < free.right() {
                split.push(Rect {
                    x: placed.right(),
                    y: free.y,
                    w: free.right() - placed.right(),
                    h: free.h,
                });
            }
            if placed.bottom() < free.bottom() {
                split.push(Rect {
                    x: free.x,
                    y: placed.bottom(),
                    w: free.w,
                    h: free.bottom() - placed.bottom(),
                });
            }
        }
        self.free_rects = split;
        self.prune_contained();

        self.used_area += placed.area();
        Some(placed)
    }

    /// Selects the free rectangle with the smallest leftover area, breaking
    /// ties by the smallest shortest-side leftover and then by scan order, so
    /// identical states always produce identical placements.
    fn find_best_area_fit(&self, width: u32, height: u32) -> Option<Rect> {
        let mut best: Option<(u64, u32, Rect)> = None;
        for free in &self.free_rects {
            if free.w < width || free.h < height {
                continue;
            }
            let leftover_area = free.area() - width as u64 * height as u64;
            let leftover_side = (free.w - width).min(free.h - height);
            let better = match best {
                None => true,
                Some((area, side, _)) => {
                    leftover_area < area || (leftover_area == area && leftover_side < side)
                }
            };
            if better {
                best = Some((leftover_area, leftover_side, *free));
            }
        }
        best.map(|(_, _, rect)| rect)
    }

    /// Drops free rectangles fully contained in another free rectangle; they
    /// offer no placement their container does not, and removing them bounds
    /// the set's growth across insertions.
    fn prune_contained(&mut self) {
        let mut i = 0;
        while i < self.free_rects.len() {
            let mut removed = false;
            let mut j = i + 1;
            while j < self.free_rects.len() {
                if self.free_rects[j].contains(&self.free_rects[i]) {
                    self.free_rects.remove(i);
                    removed = true;
                    break;
                }
                if self.free_rects[i].contains(&self.free_rects[j]) {
                    self.free_rects.remove(j);
                } else {
                    j += 1;
                }
            }
            if !removed {
                i += 1;
            }
        }
    }
}
