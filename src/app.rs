//! Application state holding the wgpu graphics context
//!
//! Owns the device, queue and surface, the scene and renderer, the webcam
//! and gesture detector handles, and the egui overlay.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::camera::Webcam;
use crate::config::Config;
use crate::photos;
use crate::render::SceneRenderer;
use crate::scene::{Mode, Scene};
use crate::vision::GestureDetector;

/// Main application state
pub struct App {
    /// Reference to the window
    window: Arc<Window>,
    /// The wgpu surface for presenting rendered frames
    surface: wgpu::Surface<'static>,
    /// The wgpu device for creating GPU resources
    device: wgpu::Device,
    /// The command queue for submitting GPU work
    queue: wgpu::Queue,
    /// Surface configuration
    config: wgpu::SurfaceConfiguration,
    /// Current window size in physical pixels
    size: PhysicalSize<u32>,

    settings: Config,
    scene: Scene,
    renderer: SceneRenderer,

    // Webcam capture and gesture detection
    webcam: Option<Webcam>,
    detector: Option<GestureDetector>,
    last_vision_frame: u64,
    last_gesture: Option<crate::vision::GestureKind>,

    ui_visible: bool,

    // egui integration
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    // Frame timing
    frame_count: u64,
    fps: f64,
    last_fps_update: Instant,
    frames_since_update: u64,
}

impl App {
    /// Create a new App instance with initialized wgpu context
    pub async fn new(window: Arc<Window>, settings: Config) -> Self {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to find suitable GPU adapter");

        log::info!("Using GPU: {}", adapter.get_info().name);
        log::info!("Backend: {:?}", adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Gesture Tree Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(&adapter);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Surface format: {:?}", surface_format);

        let present_mode = if surface_caps
            .present_modes
            .contains(&wgpu::PresentMode::Mailbox)
        {
            wgpu::PresentMode::Mailbox
        } else {
            wgpu::PresentMode::Fifo
        };

        log::info!("Present mode: {:?}", present_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };

        surface.configure(&device, &config);

        let mut renderer = SceneRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            &settings,
        );
        let mut scene = Scene::new(settings.clone());

        // Seed the tree with a greeting card so Focus mode always has a
        // photo to pull forward.
        let greeting = photos::default_greeting();
        let photo_id = renderer.add_photo(&device, &queue, &greeting);
        scene.add_photo(photo_id);

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let mut style = (*egui_ctx.style()).clone();
        style.visuals.window_shadow = egui::epaint::Shadow::NONE;
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        let now = Instant::now();

        Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            settings,
            scene,
            renderer,
            webcam: None,
            detector: None,
            last_vision_frame: 0,
            last_gesture: None,
            ui_visible: true,
            egui_ctx,
            egui_state,
            egui_renderer,
            frame_count: 0,
            fps: 60.0,
            last_fps_update: now,
            frames_since_update: 0,
        }
    }

    /// Handle a window event, returning true if egui consumed it
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(&self.window, event);
        response.consumed
    }

    /// Resize the surface
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.renderer
                .resize(&self.device, new_size.width, new_size.height);
        }
    }

    /// Get current size
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Toggle the overlay panel
    pub fn toggle_ui(&mut self) {
        self.ui_visible = !self.ui_visible;
    }

    /// Connect to a camera and start gesture detection
    pub fn connect_camera(&mut self, camera_index: u32) {
        log::info!("Connecting to camera {}", camera_index);

        match Webcam::open(camera_index) {
            Ok(webcam) => {
                log::info!("Camera capture started");
                self.webcam = Some(webcam);
                self.last_vision_frame = 0;

                if self.detector.is_none() {
                    self.init_detector();
                }
            }
            Err(e) => {
                log::error!("Failed to connect camera: {}", e);
            }
        }
    }

    /// Disconnect current camera
    pub fn disconnect_camera(&mut self) {
        if let Some(mut webcam) = self.webcam.take() {
            webcam.stop();
        }
        self.last_gesture = None;
        log::info!("Camera disconnected");
    }

    /// Initialize the hand landmark detector
    pub fn init_detector(&mut self) {
        if self.detector.is_some() {
            return;
        }

        log::info!("Initializing gesture detection...");
        match GestureDetector::new(self.settings.gesture.clone()) {
            Ok(detector) => {
                self.detector = Some(detector);
                log::info!("Gesture detection initialized");
            }
            Err(e) => {
                log::warn!("Failed to initialize gesture detection: {}", e);
            }
        }
    }

    /// Force a display mode from the keyboard, bypassing gestures
    pub fn force_mode(&mut self, mode: Mode) {
        self.scene.set_mode(mode);
        log::info!("Mode set to {:?}", mode);
    }

    /// Load an image file and hang it on the tree
    pub fn add_photo_from_path(&mut self, path: &Path) {
        match photos::load_photo(path) {
            Ok(image) => {
                let photo_id = self.renderer.add_photo(&self.device, &self.queue, &image);
                self.scene.add_photo(photo_id);
                log::info!("Added photo: {}", path.display());
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
            }
        }
    }

    /// Feed the newest webcam frame to the detector and apply its result
    pub fn update_vision(&mut self) {
        if let (Some(webcam), Some(detector)) = (&self.webcam, &self.detector) {
            if let Some(frame) = webcam.latest_frame() {
                detector.process_frame(&frame.data, frame.width, frame.height, frame.frame_number);
            }
        }

        let Some(detector) = &self.detector else {
            return;
        };
        let result = detector.latest();

        // Results arrive asynchronously; only consume each frame once.
        if result.frame_number <= self.last_vision_frame {
            return;
        }
        self.last_vision_frame = result.frame_number;

        if let Some(gesture) = result.gesture {
            self.scene.apply_gesture(&gesture);
            self.last_gesture = Some(gesture.kind);
        } else {
            self.last_gesture = None;
        }
    }

    /// Advance the scene by one fixed step
    pub fn advance_scene(&mut self) {
        self.scene.advance();
    }

    /// Render a frame
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let aspect = self.config.width as f32 / self.config.height.max(1) as f32;
        self.renderer.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &view,
            &self.scene,
            &self.settings,
            aspect,
        );

        self.render_ui(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.update_fps();

        Ok(())
    }

    fn render_ui(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let raw_input = self.egui_state.take_egui_input(&self.window);

        // Gather UI state before running egui
        let ui_visible = self.ui_visible;
        let fps = self.fps;
        let mode = self.scene.mode();
        let entity_count = self.scene.entities().len();
        let photo_count = self.scene.photo_count();
        let dust_count = self.scene.dust().points().len();
        let camera_connected = self.webcam.is_some();
        let camera_running = self
            .webcam
            .as_ref()
            .map(|w| w.is_running())
            .unwrap_or(false);
        let camera_frame_count = self.webcam.as_ref().map(|w| w.frame_count()).unwrap_or(0);
        let detector_ready = self
            .detector
            .as_ref()
            .map(|d| d.is_ready())
            .unwrap_or(false);
        let detector_initializing = self.detector.is_some() && !detector_ready;
        let last_gesture = self.last_gesture;

        let available_cameras = Webcam::list_cameras();

        let mut new_mode: Option<Mode> = None;
        let mut connect_camera_index: Option<u32> = None;
        let mut disconnect_camera = false;
        let mut init_detector = false;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !ui_visible {
                return;
            }

            egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Gesture Tree");
                    ui.separator();
                    ui.label(format!("FPS: {:.1}", fps));
                    ui.separator();
                    ui.label(format!("Mode: {:?}", mode));
                    ui.separator();
                    ui.label(format!(
                        "{} ornaments, {} photos, {} dust",
                        entity_count, photo_count, dust_count
                    ));
                });
            });

            egui::SidePanel::left("controls").show(ctx, |ui| {
                ui.heading("Camera");
                ui.separator();

                if camera_connected {
                    if camera_running {
                        ui.label(format!("Frames: {}", camera_frame_count));
                    } else {
                        ui.label("Camera stopped");
                    }
                    if ui.button("Disconnect").clicked() {
                        disconnect_camera = true;
                    }
                } else if available_cameras.is_empty() {
                    ui.label("No cameras found");
                } else {
                    ui.label("Available cameras:");
                    for cam in &available_cameras {
                        if ui.button(format!("{}: {}", cam.index, cam.name)).clicked() {
                            connect_camera_index = Some(cam.index);
                        }
                    }
                }

                ui.separator();
                ui.heading("Gestures");
                ui.separator();

                if detector_ready {
                    ui.label("Detector ready");
                    match last_gesture {
                        Some(kind) => ui.label(format!("Hand: {:?}", kind)),
                        None => ui.label("No hand"),
                    };
                } else if detector_initializing {
                    ui.label("Initializing...");
                } else {
                    ui.label("Not initialized");
                    if ui.button("Initialize").clicked() {
                        init_detector = true;
                    }
                }

                ui.separator();
                ui.heading("Mode");
                ui.separator();

                if ui
                    .selectable_label(matches!(mode, Mode::Tree), "Tree (fist)")
                    .clicked()
                {
                    new_mode = Some(Mode::Tree);
                }
                if ui
                    .selectable_label(matches!(mode, Mode::Scatter), "Scatter (open hand)")
                    .clicked()
                {
                    new_mode = Some(Mode::Scatter);
                }
                if ui
                    .selectable_label(matches!(mode, Mode::Focus), "Focus (pinch)")
                    .clicked()
                {
                    new_mode = Some(Mode::Focus);
                }

                ui.separator();
                ui.label("Drop an image file onto the window to hang it on the tree.");
            });
        });

        // Apply UI actions
        if let Some(mode) = new_mode {
            self.force_mode(mode);
        }
        if let Some(idx) = connect_camera_index {
            self.connect_camera(idx);
        }
        if disconnect_camera {
            self.disconnect_camera();
        }
        if init_detector {
            self.init_detector();
        }

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let render_pass_static: &mut wgpu::RenderPass<'static> =
                unsafe { std::mem::transmute(&mut render_pass) };

            self.egui_renderer
                .render(render_pass_static, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }

    fn update_fps(&mut self) {
        self.frame_count += 1;
        self.frames_since_update += 1;

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_update).as_secs_f64();
        if elapsed >= 1.0 {
            self.fps = self.frames_since_update as f64 / elapsed;
            self.frames_since_update = 0;
            self.last_fps_update = now;
        }
    }
}
