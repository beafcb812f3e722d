use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{ReplayPolicy, Settings};
use crate::simulation::clock::TickClock;
use crate::simulation::color::ColorDraw;
use crate::simulation::grid::Grid;

/// Composite of the playing and game-over flags, for display
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Paused,
    Running,
    GameOver,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Paused => "Paused",
            Status::Running => "Running",
            Status::GameOver => "GAME OVER",
        }
    }
}

/// Result of running one generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The grid changed and the generation counter moved forward.
    Advanced,
    /// The step produced an identical cell field; the simulation halted.
    Stable,
}

/// Read-only view handed to the render surface.
///
/// `revision` increases on every observable change, so a consumer can skip
/// work when it has already drawn the current state.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub grid: &'a Grid,
    pub generation: u64,
    pub is_playing: bool,
    pub is_game_over: bool,
    pub revision: u64,
}

/// Owner of the authoritative grid and the tick schedule.
///
/// All mutation goes through the command methods; callers only ever see
/// the grid through [`Simulation::snapshot`] or [`Simulation::grid`].
pub struct Simulation {
    grid: Grid,
    generation: u64,
    is_playing: bool,
    is_game_over: bool,
    clock: TickClock,
    draw: ColorDraw,
    density: f64,
    replay_policy: ReplayPolicy,
    rng: StdRng,
    revision: u64,
}

impl Simulation {
    /// Seed a random grid of `width` x `height` cells, paused at generation 0.
    pub fn new(width: usize, height: usize, settings: &Settings) -> Self {
        Self::with_rng(width, height, settings, StdRng::from_entropy())
    }

    /// Same as [`Simulation::new`] with a caller-supplied RNG.
    pub fn with_rng(width: usize, height: usize, settings: &Settings, mut rng: StdRng) -> Self {
        let grid = Grid::random(width, height, settings.initial_density, &mut rng);
        log::info!(
            "Simulation initialized with grid {}x{}, {} live cells, tick {}ms",
            grid.width(),
            grid.height(),
            grid.live_count(),
            settings.tick_interval_ms
        );

        Self {
            grid,
            generation: 0,
            is_playing: false,
            is_game_over: false,
            clock: TickClock::new(settings.tick_interval()),
            draw: ColorDraw::new(settings.color_probability),
            density: settings.initial_density,
            replay_policy: settings.replay_policy,
            rng,
            revision: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn replay_policy(&self) -> ReplayPolicy {
        self.replay_policy
    }

    pub fn tick_interval(&self) -> Duration {
        self.clock.interval()
    }

    /// When the next tick is due, or `None` while paused or stable.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.clock.deadline()
    }

    pub fn status(&self) -> Status {
        if self.is_game_over {
            Status::GameOver
        } else if self.is_playing {
            Status::Running
        } else {
            Status::Paused
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            grid: &self.grid,
            generation: self.generation,
            is_playing: self.is_playing,
            is_game_over: self.is_game_over,
            revision: self.revision,
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Begin ticking, with the first generation due one interval after `now`.
    pub fn start_at(&mut self, now: Instant) {
        if self.is_game_over {
            match self.replay_policy {
                ReplayPolicy::RequireReset => {
                    log::debug!("Start ignored: grid is stable, reset first");
                    return;
                }
                ReplayPolicy::ResetOnStart => {
                    log::info!("Starting a new game from a stable grid");
                    self.reset();
                }
            }
        }
        if self.is_playing {
            return;
        }

        log::info!("Starting game loop at generation #{}", self.generation);
        self.is_playing = true;
        self.clock.arm(now);
        self.touch();
    }

    pub fn stop(&mut self) {
        self.clock.cancel();
        if !self.is_playing {
            return;
        }
        log::info!("Stopping game loop at generation #{}", self.generation);
        self.is_playing = false;
        self.touch();
    }

    pub fn toggle(&mut self) {
        self.toggle_at(Instant::now());
    }

    pub fn toggle_at(&mut self, now: Instant) {
        if self.is_playing {
            self.stop();
        } else {
            self.start_at(now);
        }
    }

    /// Clock hook: run a generation if one is due at `now`.
    pub fn advance(&mut self, now: Instant) -> Option<TickOutcome> {
        if !self.is_playing {
            return None;
        }
        if self.clock.poll(now) {
            Some(self.tick())
        } else {
            None
        }
    }

    /// Compute one generation and commit it, or halt if nothing changed.
    pub fn tick(&mut self) -> TickOutcome {
        let next = self.grid.step(&self.draw, &mut self.rng);

        if next.same_cells(&self.grid) {
            self.clock.cancel();
            self.is_playing = false;
            self.is_game_over = true;
            self.touch();
            log::info!(
                "Stable configuration reached at generation #{} ({} live cells)",
                self.generation,
                self.grid.live_count()
            );
            return TickOutcome::Stable;
        }

        log::debug!(
            "Generation #{}: {} -> {} live cells",
            self.generation + 1,
            self.grid.live_count(),
            next.live_count()
        );
        self.grid = next;
        self.generation += 1;
        self.touch();
        TickOutcome::Advanced
    }

    /// Manual single step; does nothing once the grid is stable.
    pub fn step_once(&mut self) -> Option<TickOutcome> {
        if self.is_game_over {
            log::debug!("Step ignored: grid is stable");
            return None;
        }
        Some(self.tick())
    }

    /// Toggle the cell under a pointer, given in cell coordinates.
    ///
    /// An edit inside the grid revives a stable simulation (it stays paused
    /// and keeps its generation). Returns false for clicks outside the grid.
    pub fn handle_click(&mut self, x: i64, y: i64) -> bool {
        if !self.grid.contains(x, y) {
            return false;
        }

        log::debug!("Toggling cell at {},{}", x, y);
        self.grid = self.grid.toggle(x, y, &self.draw, &mut self.rng);
        self.is_game_over = false;
        self.touch();
        true
    }

    /// Stop and reseed at the current dimensions.
    pub fn reset(&mut self) {
        let (width, height) = self.grid.dimensions();
        self.reseed(width, height);
        log::info!("Resetting grid to {}x{}, generation #0", width, height);
    }

    /// Stop and kill every cell.
    pub fn clear_all(&mut self) {
        self.clock.cancel();
        self.grid = self.grid.clear();
        self.generation = 0;
        self.is_playing = false;
        self.is_game_over = false;
        self.touch();
        log::info!(
            "Clearing grid {}x{}, generation #0",
            self.grid.width(),
            self.grid.height()
        );
    }

    /// Stop and reseed a grid of the new size; prior cells are discarded.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.reseed(width, height);
        log::info!(
            "Resized grid to {}x{}, generation #0",
            self.grid.width(),
            self.grid.height()
        );
    }

    fn reseed(&mut self, width: usize, height: usize) {
        self.clock.cancel();
        self.grid = Grid::random(width, height, self.density, &mut self.rng);
        self.generation = 0;
        self.is_playing = false;
        self.is_game_over = false;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(policy: ReplayPolicy) -> Settings {
        Settings {
            replay_policy: policy,
            ..Settings::default()
        }
    }

    fn sim(policy: ReplayPolicy) -> Simulation {
        Simulation::with_rng(16, 12, &settings(policy), StdRng::seed_from_u64(11))
    }

    /// A simulation holding only a 2x2 block near the middle.
    fn block_sim(policy: ReplayPolicy) -> Simulation {
        let mut sim = sim(policy);
        sim.clear_all();
        for (x, y) in [(5, 5), (6, 5), (5, 6), (6, 6)] {
            assert!(sim.handle_click(x, y));
        }
        sim
    }

    /// A simulation holding a horizontal blinker.
    fn blinker_sim() -> Simulation {
        let mut sim = sim(ReplayPolicy::default());
        sim.clear_all();
        for (x, y) in [(4, 5), (5, 5), (6, 5)] {
            sim.handle_click(x, y);
        }
        sim
    }

    #[test]
    fn test_initial_state_is_paused() {
        let sim = sim(ReplayPolicy::default());
        assert_eq!(sim.status(), Status::Paused);
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.grid().dimensions(), (16, 12));
        assert!(sim.next_deadline().is_none());
    }

    #[test]
    fn test_start_stop() {
        let mut sim = sim(ReplayPolicy::default());
        let now = Instant::now();
        sim.start_at(now);
        assert_eq!(sim.status(), Status::Running);
        assert_eq!(sim.next_deadline(), Some(now + sim.tick_interval()));

        sim.stop();
        assert_eq!(sim.status(), Status::Paused);
        assert!(sim.next_deadline().is_none());

        let revision = sim.revision();
        sim.stop();
        assert_eq!(sim.revision(), revision, "stop is idempotent");
    }

    #[test]
    fn test_toggle_flips_playing() {
        let mut sim = sim(ReplayPolicy::default());
        sim.toggle();
        assert!(sim.is_playing());
        sim.toggle();
        assert!(!sim.is_playing());
    }

    #[test]
    fn test_blinker_advances_generation() {
        let mut sim = blinker_sim();
        assert_eq!(sim.tick(), TickOutcome::Advanced);
        assert_eq!(sim.generation(), 1);
        assert!(sim.grid().is_alive(5, 4) && sim.grid().is_alive(5, 6));
        assert_eq!(sim.tick(), TickOutcome::Advanced);
        assert_eq!(sim.generation(), 2);
        assert!(sim.grid().is_alive(4, 5) && sim.grid().is_alive(6, 5));
    }

    #[test]
    fn test_block_becomes_stable_after_one_tick() {
        let mut sim = block_sim(ReplayPolicy::default());
        sim.start();
        let generation = sim.generation();

        assert_eq!(sim.tick(), TickOutcome::Stable);
        assert!(sim.is_game_over());
        assert!(!sim.is_playing());
        assert_eq!(sim.generation(), generation);
        assert!(sim.next_deadline().is_none());
        assert_eq!(sim.status().label(), "GAME OVER");
    }

    #[test]
    fn test_advance_runs_on_schedule() {
        let mut sim = blinker_sim();
        let now = Instant::now();
        sim.start_at(now);
        let interval = sim.tick_interval();

        assert_eq!(sim.advance(now + interval / 2), None);
        assert_eq!(sim.advance(now + interval), Some(TickOutcome::Advanced));
        assert_eq!(sim.generation(), 1);
        assert_eq!(sim.advance(now + interval), None);
    }

    #[test]
    fn test_no_tick_after_stop() {
        let mut sim = blinker_sim();
        let now = Instant::now();
        sim.start_at(now);
        sim.stop();
        assert_eq!(sim.advance(now + sim.tick_interval() * 3), None);
        assert_eq!(sim.generation(), 0);
    }

    #[test]
    fn test_no_tick_after_stable() {
        let mut sim = block_sim(ReplayPolicy::default());
        let now = Instant::now();
        sim.start_at(now);
        let interval = sim.tick_interval();
        assert_eq!(sim.advance(now + interval), Some(TickOutcome::Stable));
        assert_eq!(sim.advance(now + interval * 2), None);
    }

    #[test]
    fn test_step_once_while_paused() {
        let mut sim = blinker_sim();
        assert_eq!(sim.step_once(), Some(TickOutcome::Advanced));
        assert_eq!(sim.generation(), 1);
        assert!(!sim.is_playing());
    }

    #[test]
    fn test_step_once_suppressed_while_stable() {
        let mut sim = block_sim(ReplayPolicy::default());
        sim.tick();
        let revision = sim.revision();
        assert_eq!(sim.step_once(), None);
        assert_eq!(sim.revision(), revision);
    }

    #[test]
    fn test_require_reset_policy_refuses_start() {
        let mut sim = block_sim(ReplayPolicy::RequireReset);
        sim.tick();
        let grid = sim.grid().clone();

        sim.start();
        assert!(sim.is_game_over());
        assert!(!sim.is_playing());
        sim.toggle();
        assert!(!sim.is_playing());
        assert_eq!(sim.grid(), &grid);

        sim.reset();
        sim.start();
        assert!(sim.is_playing());
    }

    #[test]
    fn test_reset_on_start_policy_starts_new_game() {
        let mut sim = block_sim(ReplayPolicy::ResetOnStart);
        sim.tick();
        assert!(sim.is_game_over());

        sim.toggle();
        assert!(!sim.is_game_over());
        assert!(sim.is_playing());
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.grid().dimensions(), (16, 12));
    }

    #[test]
    fn test_click_revives_stable_without_resetting_generation() {
        let mut sim = blinker_sim();
        sim.tick();
        sim.tick();
        // Park a block far from the blinker, then kill the blinker so only the block remains
        for (x, y) in [(12, 9), (13, 9), (12, 10), (13, 10)] {
            sim.handle_click(x, y);
        }
        for (x, y) in [(4, 5), (5, 5), (6, 5)] {
            sim.handle_click(x, y);
        }
        assert_eq!(sim.tick(), TickOutcome::Stable);
        assert!(sim.is_game_over());
        assert_eq!(sim.generation(), 2);

        assert!(sim.handle_click(0, 0));
        assert!(!sim.is_game_over());
        assert!(!sim.is_playing());
        assert_eq!(sim.generation(), 2);
    }

    #[test]
    fn test_click_outside_is_ignored() {
        let mut sim = block_sim(ReplayPolicy::default());
        sim.tick();
        let revision = sim.revision();
        assert!(!sim.handle_click(-1, 0));
        assert!(!sim.handle_click(16, 0));
        assert!(sim.is_game_over());
        assert_eq!(sim.revision(), revision);
    }

    #[test]
    fn test_reset_and_clear() {
        let mut sim = blinker_sim();
        sim.start();
        sim.tick();
        sim.reset();
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.status(), Status::Paused);
        assert_eq!(sim.grid().dimensions(), (16, 12));

        sim.start();
        sim.clear_all();
        assert_eq!(sim.status(), Status::Paused);
        assert_eq!(sim.grid().live_count(), 0);
        assert!(sim.next_deadline().is_none());
    }

    #[test]
    fn test_resize_stops_and_reseeds() {
        let mut sim = blinker_sim();
        sim.start();
        sim.tick();
        sim.resize(40, 30);
        assert_eq!(sim.grid().dimensions(), (40, 30));
        assert_eq!(sim.generation(), 0);
        assert!(!sim.is_playing());
        assert!(sim.next_deadline().is_none());
    }

    #[test]
    fn test_every_mutation_bumps_revision() {
        let mut sim = blinker_sim();
        let mut last = sim.revision();
        let mut check = |sim: &Simulation| {
            assert!(sim.revision() > last);
            last = sim.revision();
        };

        sim.start();
        check(&sim);
        sim.tick();
        check(&sim);
        sim.handle_click(0, 0);
        check(&sim);
        sim.reset();
        check(&sim);
        sim.clear_all();
        check(&sim);
        sim.resize(8, 8);
        check(&sim);
    }

    #[test]
    fn test_snapshot_mirrors_state() {
        let mut sim = blinker_sim();
        sim.start();
        sim.tick();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.generation, 1);
        assert!(snapshot.is_playing);
        assert!(!snapshot.is_game_over);
        assert_eq!(snapshot.grid, sim.grid());
        assert_eq!(snapshot.revision, sim.revision());
    }
}
