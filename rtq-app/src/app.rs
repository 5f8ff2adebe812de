use anyhow::Result;
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use rtq_core::{SessionStatus, TrialState};
use rtq_render::Renderer;
use rtq_session::{SessionConfig, SessionEvent, TrialSequencer, export};
use rtq_timing::{MonotonicTimer, Timer};
use std::sync::Arc;
use tiny_skia::Pixmap;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::{MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

const WINDOW_WIDTH: f64 = 800.0;
const WINDOW_HEIGHT: f64 = 500.0;
const EXPORT_PATH: &str = "reaction_times.csv";

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    canvas: Option<Pixmap>,
    renderer: Option<Renderer>,
    sequencer: TrialSequencer<MonotonicTimer, ThreadRng>,
    cursor: PhysicalPosition<f64>,
    current_size: Option<PhysicalSize<u32>>,
    scale_factor: f64,
    export_note: Option<String>,
    should_exit: bool,
}

impl App {
    pub fn new() -> Self {
        let config = SessionConfig::default();
        let timer = MonotonicTimer::new();
        let sequencer = TrialSequencer::new(config, timer, rand::rng());

        Self {
            window: None,
            pixels: None,
            canvas: None,
            renderer: None,
            sequencer,
            cursor: PhysicalPosition::new(0.0, 0.0),
            current_size: None,
            scale_factor: 1.0,
            export_note: None,
            should_exit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        println!("=== REACTION TIME QUANTIFIER ===");
        println!("Platform: {}", std::env::consts::OS);
        println!("Click the button when ready, then click again as fast as");
        println!("you can whenever it turns red. ESC ends the session early.\n");

        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("Reaction Time Quantifier")
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.current_size = Some(physical_size);
        self.scale_factor = window.scale_factor();

        println!("Display Configuration:");
        println!(
            "  Physical size: {}×{}",
            physical_size.width, physical_size.height
        );
        println!("  Scale factor: {:.2}", self.scale_factor);

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        self.canvas = Pixmap::new(physical_size.width, physical_size.height);
        self.renderer = Some(Renderer::new(physical_size.width, physical_size.height)?);

        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let Some(current_size) = self.current_size else {
            return Ok(());
        };
        if let (Some(pixels), Some(renderer), Some(canvas)) =
            (&mut self.pixels, &self.renderer, &mut self.canvas)
        {
            if canvas.width() != current_size.width || canvas.height() != current_size.height {
                return Ok(());
            }

            let reaction_line = match (self.sequencer.status(), self.sequencer.last_reaction_ms())
            {
                (SessionStatus::Ended, _) => self.export_note.clone().unwrap_or_default(),
                (_, Some(reaction_ms)) => format!("Reaction Time: {} ms", reaction_ms),
                _ => String::new(),
            };

            renderer.render_frame(canvas, self.sequencer.cue(), &reaction_line)?;

            pixels.frame_mut().copy_from_slice(canvas.data());
            pixels.render()?;
        }
        Ok(())
    }

    fn update(&mut self) {
        for event in self.sequencer.update() {
            match event {
                SessionEvent::StimulusShown => {
                    println!("Stimulus shown at {} ns", self.sequencer.timer.now());
                }
                SessionEvent::SessionEnded => self.export_results(),
            }
        }
    }

    fn handle_click(&mut self) {
        let Some(renderer) = &self.renderer else {
            return;
        };

        let rect = renderer.button_rect();
        let (x, y) = (self.cursor.x as f32, self.cursor.y as f32);
        if x < rect.left() || x > rect.right() || y < rect.top() || y > rect.bottom() {
            return;
        }

        match self.sequencer.state() {
            TrialState::Idle => {
                if let Some(delay_ms) = self.sequencer.start_trial() {
                    println!("Trial started, stimulus in {} ms", delay_ms);
                }
            }
            _ => {
                if let Some(reaction_ms) = self.sequencer.on_click() {
                    println!("Reaction recorded: {} ms", reaction_ms);
                }
            }
        }
    }

    /// Runs once per session: first end wins, whether it came from the
    /// duration timer or the user quitting early.
    fn export_results(&mut self) {
        match export::export_to_path(EXPORT_PATH, self.sequencer.reaction_times_ms()) {
            Ok(()) => {
                println!(
                    "Saved {} reaction times to {}",
                    self.sequencer.reaction_times_ms().len(),
                    EXPORT_PATH
                );
                self.export_note = Some(format!("Data saved to {}", EXPORT_PATH));
            }
            Err(e) => {
                eprintln!("Failed to save results to {}: {}", EXPORT_PATH, e);
                self.export_note = Some(format!("Could not save results: {}", e));
            }
        }
    }

    fn handle_input(&mut self, key: winit::keyboard::PhysicalKey, event_loop: &ActiveEventLoop) {
        use winit::keyboard::{KeyCode, PhysicalKey};
        if let PhysicalKey::Code(KeyCode::Escape) = key {
            self.cleanup_and_exit(event_loop);
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.current_size = Some(new_size);
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                eprintln!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                eprintln!("Failed to resize buffer: {}", e);
            }
        }
        self.canvas = Pixmap::new(new_size.width, new_size.height);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(new_size.width, new_size.height);
        }
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if self.sequencer.end_session() {
            self.export_results();
        }

        println!(
            "\nSession over: {} reactions recorded.",
            self.sequencer.reaction_times_ms().len()
        );

        self.should_exit = true;
        event_loop.exit();
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                eprintln!("Failed to create window and surface: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    eprintln!("Render error: {}", e);
                }
                self.update();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
            }
            WindowEvent::MouseInput { state, button, .. }
                if state.is_pressed() && button == MouseButton::Left =>
            {
                self.handle_click();
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(new_size) => self.handle_resize(new_size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
