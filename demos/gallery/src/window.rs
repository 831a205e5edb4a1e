use std::num::NonZeroU32;

use color_eyre::eyre::{Context, Result, eyre};
use glutin::{
    config::{ConfigTemplateBuilder, GlConfig},
    context::{
        ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext,
        PossiblyCurrentContext, Version,
    },
    display::{GetGlDisplay, GlDisplay},
    surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface},
};
use glutin_winit::DisplayBuilder;
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event_loop::ActiveEventLoop,
    window::{Window, WindowAttributes},
};

/// A window with a current OpenGL 3.3 core context.
pub struct GlWindow {
    pub window: Window,
    gl_context: PossiblyCurrentContext,
    gl_surface: Surface<WindowSurface>,
    pub gl: glow::Context,
}

impl GlWindow {
    pub fn new(event_loop: &ActiveEventLoop, title: &str, size: (u32, u32)) -> Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(title)
            .with_inner_size(LogicalSize::new(size.0, size.1));

        let config_template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_depth_size(24);

        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(window_attrs))
            .build(event_loop, config_template, |configs| {
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() { config } else { accum }
                    })
                    .expect("glutin offers at least one config")
            })
            .map_err(|e| eyre!("failed to build display: {e}"))?;

        let window = window.ok_or_else(|| eyre!("failed to create window"))?;
        let gl_display = gl_config.display();

        let context_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_handle(&window)?));

        let not_current_context = unsafe { gl_display.create_context(&gl_config, &context_attrs) }
            .wrap_err("failed to create GL context")?;

        let inner = window.inner_size();
        let surface_attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_handle(&window)?,
            non_zero(inner.width),
            non_zero(inner.height),
        );

        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attrs) }
            .wrap_err("failed to create GL surface")?;

        let gl_context = not_current_context
            .make_current(&gl_surface)
            .wrap_err("failed to make GL context current")?;

        if let Err(e) = gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
        {
            tracing::warn!(error = %e, "vsync unavailable");
        }

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| gl_display.get_proc_address(name))
        };

        tracing::info!(
            width = inner.width,
            height = inner.height,
            samples = gl_config.num_samples(),
            "created OpenGL 3.3 window"
        );

        Ok(Self { window, gl_context, gl_surface, gl })
    }

    pub fn physical_size(&self) -> (i32, i32) {
        let s = self.window.inner_size();
        (s.width as i32, s.height as i32)
    }

    pub fn resize_surface(&self, new_size: PhysicalSize<u32>) {
        self.gl_surface.resize(
            &self.gl_context,
            non_zero(new_size.width),
            non_zero(new_size.height),
        );
    }

    pub fn swap_buffers(&self) -> Result<()> {
        self.gl_surface
            .swap_buffers(&self.gl_context)
            .wrap_err("failed to swap buffers")
    }
}

fn raw_handle(window: &Window) -> Result<RawWindowHandle> {
    window
        .window_handle()
        .map(|handle| handle.as_raw())
        .map_err(|e| eyre!("window handle unavailable: {e}"))
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}
