use clap::ValueEnum;
use color_eyre::eyre::Result;
use glint_core::{Error, GlState, RenderContext};

use crate::scenes::{
    cube::CubeScene, fractal::FractalScene, life::LifeScene, text::TextScene,
    triangle::TriangleScene,
};

/// A self-contained demo owning its GL resources.
pub trait Scene {
    /// Advances animations; `dt` is zero while paused.
    fn update(&mut self, dt: f32);

    /// Draws a frame into the default framebuffer.
    fn render(&mut self, ctx: &mut RenderContext) -> Result<(), Error>;

    /// Called with the new framebuffer size in pixels.
    fn resize(
        &mut self,
        gl: &glow::Context,
        state: &mut GlState,
        size: (i32, i32),
    ) -> Result<(), Error>;

    /// Releases all GPU resources.
    fn delete(self: Box<Self>, gl: &glow::Context, state: &mut GlState);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneKind {
    Triangle,
    Cube,
    Fractal,
    Life,
    Text,
}

impl SceneKind {
    pub const ALL: [SceneKind; 5] = [
        SceneKind::Triangle,
        SceneKind::Cube,
        SceneKind::Fractal,
        SceneKind::Life,
        SceneKind::Text,
    ];

    /// Scene bound to a number key, `1` being the first.
    pub fn from_key(key: &str) -> Option<SceneKind> {
        let index = key.parse::<usize>().ok()?;
        Self::ALL.get(index.checked_sub(1)?).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            SceneKind::Triangle => "triangle",
            SceneKind::Cube => "cube",
            SceneKind::Fractal => "fractal",
            SceneKind::Life => "life",
            SceneKind::Text => "text",
        }
    }

    pub fn create(
        self,
        gl: &glow::Context,
        state: &mut GlState,
        size: (i32, i32),
        options: &SceneOptions,
    ) -> Result<Box<dyn Scene>> {
        let scene: Box<dyn Scene> = match self {
            SceneKind::Triangle => Box::new(TriangleScene::new(gl, size)?),
            SceneKind::Cube => Box::new(CubeScene::new(gl, size)?),
            SceneKind::Fractal => Box::new(FractalScene::new(gl, state, size)?),
            SceneKind::Life => Box::new(LifeScene::new(gl, size, options)?),
            SceneKind::Text => Box::new(TextScene::new(gl, size, options)?),
        };

        tracing::info!(scene = self.title(), "created scene");
        Ok(scene)
    }
}

/// Settings shared by the scenes, taken from the command line.
#[derive(Debug, Clone)]
pub struct SceneOptions {
    /// Font path or family for the text scene
    pub font: String,
    pub font_size: f32,
    pub board_size: (u32, u32),
    pub seed: u64,
    /// Life generations per second
    pub steps_per_second: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_select_scenes() {
        assert_eq!(SceneKind::from_key("1"), Some(SceneKind::Triangle));
        assert_eq!(SceneKind::from_key("5"), Some(SceneKind::Text));
        assert_eq!(SceneKind::from_key("0"), None);
        assert_eq!(SceneKind::from_key("6"), None);
        assert_eq!(SceneKind::from_key("x"), None);
    }
}
