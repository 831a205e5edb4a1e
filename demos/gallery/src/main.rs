//! Demo scenes for glint, rendered into a native OpenGL 3.3 window using
//! glutin (OpenGL context) and winit (windowing).
//!
//! Run with:
//! ```sh
//! cargo run -p gallery -- --scene cube
//! ```
//!
//! Keys `1`-`5` switch scenes, `Space` pauses, `Escape` quits.

mod scene;
mod scenes;
mod window;

use std::time::Instant;

use clap::Parser;
use color_eyre::eyre::{Report, Result};
use glint_core::{GlState, RenderContext};
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowId,
};

use crate::{
    scene::{Scene, SceneKind, SceneOptions},
    window::GlWindow,
};

#[derive(Parser, Debug)]
#[command(name = "gallery", version, about = "Demo scenes for the glint OpenGL toolkit")]
struct Args {
    /// Scene shown at startup
    #[arg(long, value_enum, default_value = "triangle")]
    scene: SceneKind,

    /// Window width in logical pixels
    #[arg(long, default_value_t = 960)]
    width: u32,

    /// Window height in logical pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Font file or family for the text scene
    #[arg(long, default_value = "monospace")]
    font: String,

    /// Rasterization size of the text scene's atlas
    #[arg(long, default_value_t = 28.0)]
    font_size: f32,

    /// Game of Life board size, as columns and rows
    #[arg(long, num_args = 2, value_names = ["COLS", "ROWS"], default_values_t = [160, 100])]
    board: Vec<u32>,

    /// Seed of the Game of Life board
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Game of Life generations per second
    #[arg(long, default_value_t = 12.0)]
    steps_per_second: f32,
}

impl Args {
    fn scene_options(&self) -> SceneOptions {
        let board_size = match self.board.as_slice() {
            [cols, rows] => (*cols, *rows),
            _ => (160, 100),
        };

        SceneOptions {
            font: self.font.clone(),
            font_size: self.font_size,
            board_size,
            seed: self.seed,
            steps_per_second: self.steps_per_second,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();
    let event_loop = EventLoop::new()?;
    let mut app = App::new(&args);
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(report) => Err(report),
        None => Ok(()),
    }
}

struct App {
    initial_scene: SceneKind,
    window_size: (u32, u32),
    options: SceneOptions,
    state: Option<AppState>,
    /// First fatal error; ends the event loop
    error: Option<Report>,
}

struct AppState {
    win: GlWindow,
    gl_state: GlState,
    scene: Box<dyn Scene>,
    kind: SceneKind,
    paused: bool,
    last_frame: Instant,
}

impl App {
    fn new(args: &Args) -> Self {
        Self {
            initial_scene: args.scene,
            window_size: (args.width, args.height),
            options: args.scene_options(),
            state: None,
            error: None,
        }
    }

    fn init(&self, event_loop: &ActiveEventLoop) -> Result<AppState> {
        let win = GlWindow::new(event_loop, &window_title(self.initial_scene, false), self.window_size)?;
        let mut gl_state = GlState::new(&win.gl);

        let scene = self.initial_scene.create(
            &win.gl,
            &mut gl_state,
            win.physical_size(),
            &self.options,
        )?;

        Ok(AppState {
            win,
            gl_state,
            scene,
            kind: self.initial_scene,
            paused: false,
            last_frame: Instant::now(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, report: Report) {
        tracing::error!(error = %report, "shutting down");
        if let Some(state) = self.state.take() {
            state.shutdown();
        }
        self.error.get_or_insert(report);
        event_loop.exit();
    }
}

impl AppState {
    fn switch_scene(&mut self, kind: SceneKind, options: &SceneOptions) {
        if kind == self.kind {
            return;
        }

        let size = self.win.physical_size();
        match kind.create(&self.win.gl, &mut self.gl_state, size, options) {
            Ok(scene) => {
                let previous = std::mem::replace(&mut self.scene, scene);
                previous.delete(&self.win.gl, &mut self.gl_state);
                self.gl_state.reset(&self.win.gl);
                self.kind = kind;
                self.update_title();
            },
            // the current scene keeps running
            Err(e) => tracing::warn!(scene = kind.title(), error = %e, "failed to create scene"),
        }
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.update_title();
    }

    fn update_title(&self) {
        self.win.window.set_title(&window_title(self.kind, self.paused));
    }

    fn redraw(&mut self) -> Result<()> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.scene.update(if self.paused { 0.0 } else { dt });

        let mut ctx = RenderContext::new(&self.win.gl, &mut self.gl_state);
        self.scene.render(&mut ctx)?;

        self.win.swap_buffers()
    }

    fn shutdown(mut self) {
        self.scene.delete(&self.win.gl, &mut self.gl_state);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match self.init(event_loop) {
            Ok(state) => self.state = Some(state),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            if let Some(state) = self.state.take() {
                state.shutdown();
            }
            event_loop.exit();
            return;
        }

        let Some(state) = self.state.as_mut() else {
            return;
        };

        let result = match event {
            WindowEvent::Resized(new_size) if new_size.width > 0 && new_size.height > 0 => {
                state.win.resize_surface(new_size);
                let size = (new_size.width as i32, new_size.height as i32);
                state
                    .scene
                    .resize(&state.win.gl, &mut state.gl_state, size)
                    .map_err(Report::from)
            },
            WindowEvent::KeyboardInput {
                event: KeyEvent { logical_key, state: ElementState::Pressed, repeat: false, .. },
                ..
            } => {
                match logical_key.as_ref() {
                    Key::Named(NamedKey::Escape) => {
                        if let Some(state) = self.state.take() {
                            state.shutdown();
                        }
                        event_loop.exit();
                        return;
                    },
                    Key::Named(NamedKey::Space) => state.toggle_pause(),
                    Key::Character(key) => {
                        if let Some(kind) = SceneKind::from_key(key) {
                            state.switch_scene(kind, &self.options);
                        }
                    },
                    _ => {},
                }
                Ok(())
            },
            WindowEvent::RedrawRequested => state.redraw(),
            _ => Ok(()),
        };

        if let Err(e) = result {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.as_ref() {
            state.win.window.request_redraw();
        }
    }
}

fn window_title(kind: SceneKind, paused: bool) -> String {
    let paused = if paused { " (paused)" } else { "" };
    format!("glint gallery - {}{paused}", kind.title())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default_to_the_triangle() {
        let args = Args::try_parse_from(["gallery"]).unwrap();

        assert_eq!(args.scene, SceneKind::Triangle);
        assert_eq!(args.scene_options().board_size, (160, 100));
    }

    #[test]
    fn board_size_takes_two_values() {
        let args = Args::try_parse_from(["gallery", "--scene", "life", "--board", "64", "48"]).unwrap();

        assert_eq!(args.scene, SceneKind::Life);
        assert_eq!(args.scene_options().board_size, (64, 48));
    }

    #[test]
    fn title_shows_pause_state() {
        assert_eq!(window_title(SceneKind::Cube, false), "glint gallery - cube");
        assert_eq!(window_title(SceneKind::Life, true), "glint gallery - life (paused)");
    }
}
