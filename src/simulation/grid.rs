use rand::Rng;

use crate::simulation::color::{ColorDraw, Rgb};

/// One generation of the cell field.
///
/// Cells are stored row-major (`y * width + x`). `colors` runs parallel to
/// `cells`: a live cell always carries a color, a dead cell never does.
/// Dimensions are fixed once a grid is built; every transformation returns
/// a new value and leaves `self` untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
    colors: Vec<Option<Rgb>>,
}

impl Grid {
    /// Create a grid with every cell dead.
    ///
    /// Zero dimensions are raised to 1.
    pub fn empty(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let cell_count = width * height;
        Self {
            width,
            height,
            cells: vec![false; cell_count],
            colors: vec![None; cell_count],
        }
    }

    /// Create a grid where each cell is independently alive with probability `density`.
    ///
    /// Seeded cells are plain white; palette hues only appear through births.
    pub fn random<R: Rng>(width: usize, height: usize, density: f64, rng: &mut R) -> Self {
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        let mut grid = Self::empty(width, height);
        for i in 0..grid.cells.len() {
            if rng.gen_bool(density) {
                grid.cells[i] = true;
                grid.colors[i] = Some(Rgb::WHITE);
            }
        }
        grid
    }

    /// Load a pattern from ASCII rows, `#` or `O` for alive and anything else dead.
    ///
    /// Short rows are padded with dead cells to the widest row.
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        let mut grid = Self::empty(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if matches!(ch, '#' | 'O') {
                    let idx = grid.index(x, y);
                    grid.cells[idx] = true;
                    grid.colors[idx] = Some(Rgb::WHITE);
                }
            }
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Row-major liveness field
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Bounds-checked conversion from signed coordinates to a cell index.
    fn checked_index(&self, x: i64, y: i64) -> Option<usize> {
        if self.contains(x, y) {
            Some(self.index(x as usize, y as usize))
        } else {
            None
        }
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.width as u64 && (y as u64) < self.height as u64
    }

    /// Liveness at `(x, y)`; anything outside the grid is dead.
    pub fn is_alive(&self, x: i64, y: i64) -> bool {
        self.checked_index(x, y).is_some_and(|idx| self.cells[idx])
    }

    pub fn color_at(&self, x: i64, y: i64) -> Option<Rgb> {
        self.checked_index(x, y).and_then(|idx| self.colors[idx])
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// True when both grids have the same dimensions and liveness field.
    ///
    /// Colors are ignored.
    pub fn same_cells(&self, other: &Grid) -> bool {
        self.width == other.width && self.height == other.height && self.cells == other.cells
    }

    /// Count live cells in the Moore neighborhood of `(x, y)`.
    ///
    /// The boundary is fixed: positions outside the grid count as dead, there
    /// is no wraparound.
    pub fn count_live_neighbors(&self, x: i64, y: i64) -> u8 {
        let mut count = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if self.is_alive(x.saturating_add(dx), y.saturating_add(dy)) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Compute the next generation under B3/S23.
    ///
    /// Survivors keep their color; each birth draws a fresh one.
    pub fn step<R: Rng>(&self, draw: &ColorDraw, rng: &mut R) -> Grid {
        let mut next = Grid::empty(self.width, self.height);

        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                let live_neighbors = self.count_live_neighbors(x as i64, y as i64);

                match (self.cells[idx], live_neighbors) {
                    (true, 2) | (true, 3) => {
                        next.cells[idx] = true;
                        next.colors[idx] = self.colors[idx].or(Some(Rgb::WHITE));
                    }
                    (false, 3) => {
                        next.cells[idx] = true;
                        next.colors[idx] = Some(draw.draw(rng));
                    }
                    _ => {}
                }
            }
        }

        next
    }

    /// Flip the cell at `(x, y)`.
    ///
    /// Out-of-range coordinates return an unchanged copy. A revived cell draws
    /// a new color, so toggling twice restores liveness but not necessarily
    /// the previous color.
    pub fn toggle<R: Rng>(&self, x: i64, y: i64, draw: &ColorDraw, rng: &mut R) -> Grid {
        let mut next = self.clone();
        if let Some(idx) = self.checked_index(x, y) {
            if next.cells[idx] {
                next.cells[idx] = false;
                next.colors[idx] = None;
            } else {
                next.cells[idx] = true;
                next.colors[idx] = Some(draw.draw(rng));
            }
        }
        next
    }

    /// All cells dead, same dimensions.
    pub fn clear(&self) -> Grid {
        Grid::empty(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::color::PALETTE;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn test_grid_creation() {
        let grid = Grid::empty(100, 50);
        assert_eq!(grid.dimensions(), (100, 50));
        assert_eq!(grid.cells().len(), 5000);
        assert_eq!(grid.live_count(), 0);
    }

    #[test]
    fn test_zero_dimensions_are_raised() {
        assert_eq!(Grid::empty(0, 0).dimensions(), (1, 1));
    }

    #[test]
    fn test_random_density_extremes() {
        let mut rng = rng();
        assert_eq!(Grid::random(20, 20, 0.0, &mut rng).live_count(), 0);
        assert_eq!(Grid::random(20, 20, 1.0, &mut rng).live_count(), 400);
    }

    #[test]
    fn test_random_cells_are_white() {
        let grid = Grid::random(30, 30, 0.5, &mut rng());
        for y in 0..30 {
            for x in 0..30 {
                if grid.is_alive(x, y) {
                    assert_eq!(grid.color_at(x, y), Some(Rgb::WHITE));
                } else {
                    assert_eq!(grid.color_at(x, y), None);
                }
            }
        }
    }

    #[test]
    fn test_from_rows_pads_ragged_rows() {
        let grid = Grid::from_rows(&["#..", "O", ".#"]);
        assert_eq!(grid.dimensions(), (3, 3));
        assert!(grid.is_alive(0, 0));
        assert!(grid.is_alive(0, 1));
        assert!(grid.is_alive(1, 2));
        assert!(!grid.is_alive(2, 1));
        assert_eq!(grid.live_count(), 3);
    }

    #[test]
    fn test_single_center_cell_neighbors() {
        let grid = Grid::from_rows(&["...", ".#.", "..."]);
        assert_eq!(grid.count_live_neighbors(1, 1), 0);
        for (x, y) in [(0, 0), (1, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)] {
            assert_eq!(grid.count_live_neighbors(x, y), 1, "at ({}, {})", x, y);
        }
    }

    #[test]
    fn test_corner_does_not_wrap() {
        let grid = Grid::from_rows(&["###", "###", "###"]);
        assert_eq!(grid.count_live_neighbors(0, 0), 3);
        assert_eq!(grid.count_live_neighbors(2, 2), 3);
        assert_eq!(grid.count_live_neighbors(1, 0), 5);
        assert_eq!(grid.count_live_neighbors(1, 1), 8);

        // Opposite corner alive must not leak into (0, 0)
        let grid = Grid::from_rows(&["...", "...", "..#"]);
        assert_eq!(grid.count_live_neighbors(0, 0), 0);
    }

    #[test]
    fn test_out_of_bounds_neighbors() {
        let grid = Grid::from_rows(&["##", "##"]);
        assert_eq!(grid.count_live_neighbors(2, 2), 1);
        assert_eq!(grid.count_live_neighbors(-1, -1), 1);
        assert_eq!(grid.count_live_neighbors(10, 10), 0);
        assert_eq!(grid.count_live_neighbors(i64::MAX, i64::MIN), 0);
    }

    #[test]
    fn test_block_is_still_life() {
        let grid = Grid::from_rows(&["....", ".##.", ".##.", "...."]);
        let next = grid.step(&ColorDraw::default(), &mut rng());
        assert!(next.same_cells(&grid));
        assert_eq!(next, grid);
    }

    #[test]
    fn test_blinker_oscillates() {
        let horizontal = Grid::from_rows(&[".....", ".....", ".###.", ".....", "....."]);
        let vertical = Grid::from_rows(&[".....", "..#..", "..#..", "..#..", "....."]);
        let mut rng = rng();
        let draw = ColorDraw::default();

        let once = horizontal.step(&draw, &mut rng);
        assert!(once.same_cells(&vertical));
        let twice = once.step(&draw, &mut rng);
        assert!(twice.same_cells(&horizontal));
    }

    #[test]
    fn test_survivors_keep_color() {
        let mut rng = rng();
        let always = ColorDraw::new(1.0);
        let block = Grid::from_rows(&["....", "....", "....", "...."]);
        let mut grid = block;
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            grid = grid.toggle(x, y, &always, &mut rng);
        }
        let before: Vec<_> = (1..=2)
            .flat_map(|y| (1..=2).map(move |x| (x, y)))
            .map(|(x, y)| grid.color_at(x, y))
            .collect();

        let next = grid.step(&ColorDraw::new(0.0), &mut rng);
        let after: Vec<_> = (1..=2)
            .flat_map(|y| (1..=2).map(move |x| (x, y)))
            .map(|(x, y)| next.color_at(x, y))
            .collect();
        assert_eq!(before, after);
        assert!(after.iter().all(|c| c.is_some_and(|c| PALETTE.contains(&c))));
    }

    #[test]
    fn test_births_draw_color() {
        let grid = Grid::from_rows(&[".....", ".....", ".###.", ".....", "....."]);
        let next = grid.step(&ColorDraw::new(1.0), &mut rng());
        let born = [(2, 1), (2, 3)];
        for (x, y) in born {
            let color = next.color_at(x, y).unwrap();
            assert!(PALETTE.contains(&color));
        }
        // Dead cells carry no color
        assert_eq!(next.color_at(1, 2), None);
    }

    #[test]
    fn test_colors_do_not_affect_rule() {
        let grid = Grid::random(40, 30, 0.3, &mut rng());
        let plain = grid.step(&ColorDraw::new(0.0), &mut rng());
        let colored = grid.step(&ColorDraw::new(1.0), &mut rng());
        assert!(plain.same_cells(&colored));
    }

    #[test]
    fn test_toggle_flips_and_colors() {
        let mut rng = rng();
        let grid = Grid::empty(4, 4);
        let on = grid.toggle(1, 2, &ColorDraw::new(0.0), &mut rng);
        assert!(on.is_alive(1, 2));
        assert_eq!(on.color_at(1, 2), Some(Rgb::WHITE));
        assert!(!grid.is_alive(1, 2), "input grid must be untouched");

        let off = on.toggle(1, 2, &ColorDraw::new(0.0), &mut rng);
        assert!(!off.is_alive(1, 2));
        assert_eq!(off.color_at(1, 2), None);
    }

    #[test]
    fn test_toggle_out_of_bounds_is_noop() {
        let mut rng = rng();
        let grid = Grid::random(5, 5, 0.5, &mut rng);
        let draw = ColorDraw::default();
        assert_eq!(grid.toggle(-1, 0, &draw, &mut rng), grid);
        assert_eq!(grid.toggle(0, -1, &draw, &mut rng), grid);
        assert_eq!(grid.toggle(5, 0, &draw, &mut rng), grid);
        assert_eq!(grid.toggle(0, 5, &draw, &mut rng), grid);
    }

    #[test]
    fn test_clear_preserves_dimensions() {
        let grid = Grid::random(37, 11, 0.4, &mut rng());
        let cleared = grid.clear();
        assert_eq!(cleared.width(), grid.width());
        assert_eq!(cleared.height(), grid.height());
        assert_eq!(cleared.live_count(), 0);
    }
}
