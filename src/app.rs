use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

use crate::gpu::{GpuContext, GpuError};
use crate::input::{Command, KeyBindings};
use crate::lit_pass::LitPass;
use crate::scene::Scene;

/// Errors that stop the viewer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// Configuration for the viewer window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub bindings: KeyBindings,
    pub clear_color: wgpu::Color,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Vitrine".to_string(),
            width: 1000,
            height: 1000,
            bindings: KeyBindings::default(),
            clear_color: wgpu::Color::BLACK,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn bindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }
}

/// Opens the window and runs the scene until it is closed.
///
/// # Example
/// ```no_run
/// use vitrine::{AppConfig, Scene};
///
/// let scene = Scene::load("assets/scene.json");
/// vitrine::run(AppConfig::new().title("Viewer"), scene).unwrap();
/// ```
pub fn run(config: AppConfig, scene: Scene) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::Pending {
        config,
        scene: Some(scene),
    };

    event_loop.run_app(&mut app)?;

    match app {
        ViewerApp::Failed(e) => Err(e),
        _ => Ok(()),
    }
}

enum ViewerApp {
    Pending {
        config: AppConfig,
        scene: Option<Scene>,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        lit_pass: LitPass,
        scene: Scene,
        bindings: KeyBindings,
        clear_color: wgpu::Color,
        start_time: Instant,
    },
    Failed(AppError),
}

impl ViewerApp {
    fn start(
        event_loop: &ActiveEventLoop,
        config: &AppConfig,
        mut scene: Scene,
    ) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let lit_pass = LitPass::new(&gpu);

        scene.initialize(&gpu, &lit_pass);
        capture_cursor(&window);

        Ok(ViewerApp::Running {
            window,
            gpu,
            lit_pass,
            scene,
            bindings: config.bindings.clone(),
            clear_color: config.clear_color,
            start_time: Instant::now(),
        })
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let ViewerApp::Pending { config, scene } = self else {
            return;
        };
        let scene = scene.take().unwrap_or_default();

        *self = match Self::start(event_loop, config, scene) {
            Ok(running) => running,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                ViewerApp::Failed(e)
            }
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let ViewerApp::Running {
            window,
            gpu,
            lit_pass,
            scene,
            bindings,
            clear_color,
            start_time,
        } = self
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => match bindings.command_for_event(&event) {
                Some(Command::Quit) => event_loop.exit(),
                Some(command) => scene.apply(command),
                None => {}
            },
            WindowEvent::RedrawRequested => {
                let time = start_time.elapsed().as_secs_f32();
                lit_pass.ensure_depth_size(gpu);
                scene.update();
                let frame = scene.frame_context(gpu.aspect(), time);
                render(gpu, lit_pass, scene, &frame, *clear_color);
                window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        let ViewerApp::Running { scene, .. } = self else {
            return;
        };

        // Screen y grows downward; the camera wants positive = look up.
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            scene.look(dx as f32, -dy as f32);
        }
    }
}

fn capture_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
    if let Err(e) = grabbed {
        log::warn!("Could not grab cursor: {}", e);
    }
    window.set_cursor_visible(false);
}

fn render(
    gpu: &mut GpuContext,
    lit_pass: &LitPass,
    scene: &Scene,
    frame: &crate::scene::FrameContext,
    clear_color: wgpu::Color,
) {
    let output = match gpu.surface.get_current_texture() {
        Ok(output) => output,
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            let (width, height) = (gpu.width(), gpu.height());
            gpu.resize(width, height);
            return;
        }
        Err(e) => {
            log::warn!("Skipping frame: {}", e);
            return;
        }
    };
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Encoder"),
        });

    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: lit_pass.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        scene.draw(gpu, &mut render_pass, lit_pass, frame);
    }

    gpu.queue.submit(std::iter::once(encoder.finish()));
    output.present();
}
