use glint_core::{
    Error, GlState, RenderContext, ShaderProgram, Texture2D, TextureFormat,
    gl::{ClearFlags, TextureFilter, TextureWrap},
};

use super::TexturedQuad;
use crate::scene::{Scene, SceneOptions};

const QUAD_SHADER: &str = include_str!("../shaders/quad.vert");
const LIFE_SHADER: &str = include_str!("../shaders/life.frag");

const ALIVE: u8 = 0xff;
const DEAD: u8 = 0x00;

/// Conway's Game of Life on a torus.
///
/// Cells are stored row-major with row 0 at the top, one byte per cell, so
/// the board uploads directly into an `R8` texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifeBoard {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl LifeBoard {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, cells: vec![DEAD; width * height] }
    }

    /// A board with roughly a quarter of the cells alive, plus a glider in
    /// the top-left corner.
    pub fn seeded(width: usize, height: usize, seed: u64) -> Self {
        let mut board = Self::new(width, height);
        let mut rng = XorShift64::new(seed);
        for cell in &mut board.cells {
            *cell = if rng.next_u64() % 4 == 0 { ALIVE } else { DEAD };
        }

        board.clear_area(0, 0, 5, 5);
        board.add_glider(1, 1);
        board
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x] == ALIVE
    }

    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        let (x, y) = (x % self.width, y % self.height);
        self.cells[y * self.width + x] = if alive { ALIVE } else { DEAD };
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c == ALIVE).count()
    }

    /// Places a glider heading down and to the right, top-left at `(x, y)`.
    pub fn add_glider(&mut self, x: usize, y: usize) {
        for (dx, dy) in [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)] {
            self.set(x + dx, y + dy, true);
        }
    }

    fn clear_area(&mut self, x: usize, y: usize, width: usize, height: usize) {
        for dy in 0..height {
            for dx in 0..width {
                self.set(x + dx, y + dy, false);
            }
        }
    }

    /// Advances one generation; the edges wrap around.
    pub fn step(&mut self) {
        let (w, h) = (self.width, self.height);
        let next = (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .map(|(x, y)| {
                let neighbors = self.live_neighbors(x, y);
                match (self.is_alive(x, y), neighbors) {
                    (true, 2 | 3) | (false, 3) => ALIVE,
                    _ => DEAD,
                }
            })
            .collect();

        self.cells = next;
    }

    fn live_neighbors(&self, x: usize, y: usize) -> usize {
        let (w, h) = (self.width, self.height);
        [h - 1, 0, 1]
            .iter()
            .flat_map(|&dy| [w - 1, 0, 1].map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| (dx, dy) != (0, 0))
            .filter(|&(dx, dy)| self.is_alive((x + dx) % w, (y + dy) % h))
            .count()
    }
}

/// Marsaglia's xorshift64; deterministic for a given seed.
#[derive(Debug, Clone)]
struct XorShift64(u64);

impl XorShift64 {
    fn new(seed: u64) -> Self {
        // zero is a fixed point
        Self(if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed })
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

/// Fixed-rate simulation displayed through a nearest-filtered texture.
pub struct LifeScene {
    board: LifeBoard,
    texture: Texture2D,
    program: ShaderProgram,
    quad: TexturedQuad,
    size: (i32, i32),
    step_interval: f32,
    accumulator: f32,
    dirty: bool,
}

impl LifeScene {
    pub fn new(gl: &glow::Context, size: (i32, i32), options: &SceneOptions) -> Result<Self, Error> {
        let (width, height) = options.board_size;
        let board = LifeBoard::seeded(width.max(3) as usize, height.max(3) as usize, options.seed);

        let texture = Texture2D::new(
            gl,
            board.width() as i32,
            board.height() as i32,
            TextureFormat::R8,
            Some(board.cells()),
        )?;
        texture.set_sampling(gl, TextureFilter::Nearest, TextureWrap::Repeat);

        let program = super::program(gl, QUAD_SHADER, LIFE_SHADER)?;
        let quad = TexturedQuad::new(gl, &program, true)?;

        tracing::debug!(
            width = board.width(),
            height = board.height(),
            population = board.population(),
            "seeded life board"
        );

        Ok(Self {
            board,
            texture,
            program,
            quad,
            size,
            step_interval: 1.0 / options.steps_per_second.max(0.1),
            accumulator: 0.0,
            dirty: false,
        })
    }
}

impl Scene for LifeScene {
    fn update(&mut self, dt: f32) {
        // bounded catch-up after stalls
        self.accumulator = (self.accumulator + dt).min(self.step_interval * 8.0);
        while self.accumulator >= self.step_interval {
            self.accumulator -= self.step_interval;
            self.board.step();
            self.dirty = true;
        }
    }

    fn render(&mut self, ctx: &mut RenderContext) -> Result<(), Error> {
        let gl = ctx.gl;
        if self.dirty {
            self.texture.upload(gl, self.board.cells())?;
            self.dirty = false;
        }

        ctx.state
            .viewport(gl, 0, 0, self.size.0, self.size.1)
            .clear(gl, ClearFlags::COLOR);

        self.texture.bind(gl, ctx.state, 0);
        self.program.bind(gl, ctx.state);
        self.program.set_uniform(gl, "u_board", &0i32)?;
        self.program.set_uniform(gl, "u_alive", &[0.31f32, 0.98, 0.48])?;
        self.program.set_uniform(gl, "u_dead", &[0.16f32, 0.16, 0.21])?;
        self.quad.draw(gl);

        Ok(())
    }

    fn resize(&mut self, _gl: &glow::Context, _state: &mut GlState, size: (i32, i32)) -> Result<(), Error> {
        self.size = size;
        Ok(())
    }

    fn delete(self: Box<Self>, gl: &glow::Context, state: &mut GlState) {
        self.quad.delete(gl);
        self.texture.delete(gl);
        self.program.delete(gl, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(width: usize, height: usize, alive: &[(usize, usize)]) -> LifeBoard {
        let mut board = LifeBoard::new(width, height);
        for &(x, y) in alive {
            board.set(x, y, true);
        }
        board
    }

    #[test]
    fn blinker_oscillates() {
        let horizontal = board_with(5, 5, &[(1, 2), (2, 2), (3, 2)]);
        let vertical = board_with(5, 5, &[(2, 1), (2, 2), (2, 3)]);

        let mut board = horizontal.clone();
        board.step();
        assert_eq!(board, vertical);
        board.step();
        assert_eq!(board, horizontal);
    }

    #[test]
    fn block_is_still() {
        let block = board_with(4, 4, &[(1, 1), (2, 1), (1, 2), (2, 2)]);
        let mut board = block.clone();
        board.step();
        assert_eq!(board, block);
    }

    #[test]
    fn lonely_cells_die() {
        let mut board = board_with(4, 4, &[(0, 0), (2, 2)]);
        board.step();
        assert_eq!(board.population(), 0);
    }

    #[test]
    fn glider_wraps_around_the_torus() {
        let mut board = LifeBoard::new(8, 8);
        board.add_glider(0, 0);
        let start = board.clone();

        // a glider moves one cell diagonally every four generations
        for _ in 0..4 * 8 {
            board.step();
            assert_eq!(board.population(), 5);
        }
        assert_eq!(board, start);
    }

    #[test]
    fn neighbors_wrap_at_edges() {
        let board = board_with(4, 4, &[(3, 3), (0, 3), (3, 0)]);
        assert_eq!(board.live_neighbors(0, 0), 3);
    }

    #[test]
    fn seeding_is_deterministic() {
        let a = LifeBoard::seeded(32, 16, 42);
        let b = LifeBoard::seeded(32, 16, 42);
        let c = LifeBoard::seeded(32, 16, 43);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_alive(2, 1) && a.is_alive(3, 2));
        assert!(a.population() > 5);
    }

    #[test]
    fn xorshift_never_sticks_at_zero() {
        let mut rng = XorShift64::new(0);
        assert_ne!(rng.next_u64(), 0);
    }
}
