//! Demo scene: two spheres over a cobblestone floor under a sky, lit by one
//! directional light with shadows.
//!
//! Usage: `umbra [config.toml]`
//!
//! | Keys               | Action                          |
//! |--------------------|---------------------------------|
//! | W A S D            | move                            |
//! | Space / Shift      | up / down                       |
//! | Q / E              | turn                            |
//! | Z / X, R / F       | tilt the floor                  |
//! | B (hold)           | show the shadow map             |
//! | Escape             | quit                            |

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use umbra::{
    Camera, CameraControls, Cubemap, CubemapId, DeferredRenderer, Entity, GpuContext, Input,
    LightingInstance, LightingUniforms, LoggingConfig, Mat4, MaterialInstance, Mesh, MeshId, Quat,
    RenderData, RenderError, Renderable, RendererConfig, ResourceRegistry, Shader, ShaderId,
    ShaderKind, SkyInstance, SkyUniforms, Skybox, Texture, TextureData, Transform, Vec3, Vec4,
    World, init_logging, shadow_projection,
};

struct Shaders {
    geometry: ShaderId,
    shadow: ShaderId,
    screen: ShaderId,
    skybox: ShaderId,
}

struct Sky {
    day: CubemapId,
    dusk: CubemapId,
    mesh: MeshId,
}

struct Demo {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: DeferredRenderer,
    registry: ResourceRegistry,
    world: World,
    floor: Entity,
    camera: Camera,
    controls: CameraControls,
    input: Input,
    shaders: Shaders,
    sky: Sky,
    quad: MeshId,
    light_space: Mat4,
    lighting: LightingUniforms,
    start: Instant,
    last_frame: Instant,
}

enum App {
    Pending(RendererConfig),
    Running(Box<Demo>),
    Failed,
}

impl Demo {
    fn new(event_loop: &ActiveEventLoop, config: &RendererConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let attributes = WindowAttributes::default()
            .with_title(config.window.title.as_str())
            .with_inner_size(winit::dpi::PhysicalSize::new(config.window.width, config.window.height));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let gpu = GpuContext::new(window.clone())?;
        let renderer = DeferredRenderer::new(&gpu, gpu.width(), gpu.height(), config)?;

        let mut registry = ResourceRegistry::new();
        let shaders = Shaders {
            geometry: registry.add_shader(Shader::builtin(&gpu, ShaderKind::Geometry)),
            shadow: registry.add_shader(Shader::builtin(&gpu, ShaderKind::Shadow)),
            screen: registry.add_shader(Shader::builtin(&gpu, ShaderKind::Screen)),
            skybox: registry.add_shader(Shader::builtin(&gpu, ShaderKind::Skybox)),
        };

        let sphere = registry.add_mesh(Mesh::sphere(&gpu, 48, 24));
        let floor_mesh = registry.add_mesh(Mesh::plane(&gpu, 2.0));
        let quad = registry.add_mesh(Mesh::fullscreen_quad(&gpu));

        let wall = registry.add_texture(Texture::new(
            &gpu,
            &TextureData::checker(256, 8, [196, 180, 160, 255], [120, 104, 92, 255]),
            "wall",
        ));
        let cobblestone = registry.add_texture(Texture::new(
            &gpu,
            &TextureData::noise(128, 7, &[[92, 88, 84], [120, 116, 108], [70, 66, 64]]),
            "cobblestone",
        ));

        let day_faces = sky_faces([110, 160, 230], [225, 235, 245]);
        let dusk_faces = sky_faces([40, 40, 90], [240, 140, 90]);
        let sky = Sky {
            day: registry.add_cubemap(Cubemap::new(&gpu, face_refs(&day_faces), "day sky")),
            dusk: registry.add_cubemap(Cubemap::new(&gpu, face_refs(&dusk_faces), "dusk sky")),
            mesh: registry.add_mesh(Mesh::cube(&gpu)),
        };

        let mut world = World::new();
        world.spawn((
            Transform::new(),
            Renderable::new(sphere, wall).tiling(2.0, 2.0),
        ));
        world.spawn((
            Transform::from_position(Vec3::new(4.0, -0.4, 6.0)),
            Renderable::new(sphere, wall).tiling(2.0, 2.0),
        ));
        let floor = world.spawn((
            Transform::from_position(Vec3::new(0.0, -1.0, 0.0)).uniform_scale(10.0),
            Renderable::new(floor_mesh, cobblestone).tiling(25.0, 25.0),
        ));

        let mut camera = Camera::new(gpu.width(), gpu.height(), config.camera.near, config.camera.far);
        camera.transform.position = Vec3::from_array(config.camera.position);
        camera.update();

        let lighting = LightingUniforms::from(&config.lighting);
        let light_space = shadow_projection(lighting.directional.truncate(), &config.shadow);

        log::info!(
            "demo scene ready: {} entities, resources {:?}",
            world.len(),
            registry.counts()
        );

        Ok(Self {
            window,
            gpu,
            renderer,
            registry,
            world,
            floor,
            camera,
            controls: CameraControls::from(&config.camera),
            input: Input::new(),
            shaders,
            sky,
            quad,
            light_space,
            lighting,
            start: Instant::now(),
            last_frame: Instant::now(),
        })
    }

    fn update(&mut self, dt: f32) {
        self.controls.apply(&self.input, &mut self.camera, dt);

        let tilt_x = self.input.axis(KeyCode::KeyZ, KeyCode::KeyX);
        let tilt_z = self.input.axis(KeyCode::KeyF, KeyCode::KeyR);
        if tilt_x != 0.0 || tilt_z != 0.0 {
            if let Ok(mut transform) = self.world.get::<&mut Transform>(self.floor) {
                let speed = self.controls.turn_speed * dt;
                transform.rotation *= Quat::from_rotation_x(tilt_x * speed) * Quat::from_rotation_z(tilt_z * speed);
                transform.update();
            }
        }

        self.renderer.debug_buffers = self.input.key_down(KeyCode::KeyB);
        self.input.begin_frame();
    }

    fn redraw(&mut self) -> Result<(), RenderError> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.update(dt);

        let Some(surface) = &self.gpu.surface else {
            return Ok(());
        };
        let output = match surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = (self.gpu.width(), self.gpu.height());
                self.gpu.resize(width, height);
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let registry = &self.registry;
        let (Some(geometry), Some(shadow), Some(screen), Some(sky_shader)) = (
            registry.shader(self.shaders.geometry),
            registry.shader(self.shaders.shadow),
            registry.shader(self.shaders.screen),
            registry.shader(self.shaders.skybox),
        ) else {
            return Ok(());
        };

        let mut query = self.world.query::<(&Transform, &Renderable)>();
        let objects: Vec<_> = query
            .iter()
            .filter_map(|(_, (transform, renderable))| {
                let mesh = registry.mesh(renderable.mesh)?;
                let texture = registry.texture(renderable.texture)?;
                let material = MaterialInstance::new(geometry, renderable.material);
                Some((transform, mesh, texture, material))
            })
            .collect();

        let elapsed = self.start.elapsed().as_secs_f32();
        let sky_instance = SkyInstance::new(
            sky_shader,
            SkyUniforms {
                tint: Vec4::ONE,
                transition: (elapsed * 0.1).sin() * 0.5 + 0.5,
            },
        );
        let lighting = LightingInstance::new(screen, self.lighting);

        let mut frame = self.renderer.begin(&self.gpu);
        for (transform, mesh, texture, material) in &objects {
            frame.render(
                &self.camera,
                &RenderData {
                    transform: *transform,
                    mesh: *mesh,
                    texture: *texture,
                    material,
                    shadow_shader: shadow,
                    light_space_matrix: self.light_space,
                },
            )?;
        }

        if let (Some(day), Some(mesh)) = (registry.cubemap(self.sky.day), registry.mesh(self.sky.mesh)) {
            let skybox = Skybox {
                cubemap: day,
                next: registry.cubemap(self.sky.dusk),
                mesh,
            };
            frame.sky(&self.camera, &skybox, &sky_instance)?;
        }

        if let Some(quad) = registry.mesh(self.quad) {
            frame.light(&lighting, quad, &view)?;
        }
        output.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.renderer.resize(width, height);
        self.camera.resize(width, height);
    }
}

/// Vertical gradient faces: `zenith` on top, `horizon` around, darker below.
fn sky_faces(zenith: [u8; 3], horizon: [u8; 3]) -> [TextureData; 6] {
    const SIZE: u32 = 64;
    let lerp = |a: [u8; 3], b: [u8; 3], t: f32| -> [u8; 4] {
        let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
        [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), 255]
    };
    let ground = [horizon[0] / 3, horizon[1] / 3, horizon[2] / 3];

    let side = || {
        let pixels = (0..SIZE)
            .flat_map(|y| {
                let t = y as f32 / (SIZE - 1) as f32;
                let color = if t < 0.5 {
                    lerp(zenith, horizon, t * 2.0)
                } else {
                    lerp(horizon, ground, (t - 0.5) * 2.0)
                };
                std::iter::repeat_n(color, SIZE as usize).flatten()
            })
            .collect();
        TextureData::rgba(SIZE, SIZE, pixels)
    };
    let solid = |color: [u8; 3]| {
        let [r, g, b] = color;
        TextureData::solid([r, g, b, 255])
    };

    [side(), side(), solid(zenith), solid(ground), side(), side()]
}

fn face_refs(faces: &[TextureData; 6]) -> [&TextureData; 6] {
    [&faces[0], &faces[1], &faces[2], &faces[3], &faces[4], &faces[5]]
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let App::Pending(config) = self else {
            return;
        };
        *self = match Demo::new(event_loop, config) {
            Ok(demo) => App::Running(Box::new(demo)),
            Err(error) => {
                log::error!("failed to start: {error}");
                event_loop.exit();
                App::Failed
            }
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let App::Running(demo) = self else {
            return;
        };

        demo.input.handle_event(&event);
        if demo.input.key_pressed(KeyCode::Escape) {
            event_loop.exit();
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => demo.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if let Err(error) = demo.redraw() {
                    log::error!("frame failed: {error}");
                }
                demo.window.request_redraw();
            }
            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default());

    let config = match std::env::args().nth(1) {
        Some(path) => RendererConfig::load(&path)?,
        None => RendererConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run_app(&mut App::Pending(config))?;
    Ok(())
}
