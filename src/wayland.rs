use anyhow::{Context, Result};
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_layer, delegate_output, delegate_registry, delegate_shm,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    shell::wlr_layer::{
        Anchor, KeyboardInteractivity, Layer, LayerShell, LayerShellHandler, LayerSurface,
        LayerSurfaceConfigure,
    },
    shell::WaylandSurface,
    shm::{slot::SlotPool, Shm, ShmHandler},
};
use wayland_client::{
    globals::registry_queue_init,
    protocol::{wl_output, wl_shm, wl_surface},
    Connection, QueueHandle,
};

use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::canvas::{Canvas, FontState};
use crate::config::{self, WatchConfig};
use crate::dial::DisplayShape;
use crate::geometry::Rect;
use crate::ipc;
use crate::renderer::{self, FaceAssets, FaceState};
use crate::time_utils::{self, WallTime};

pub struct Watchface {
    registry_state: RegistryState,
    output_state: OutputState,
    shm: Shm,
    pool: SlotPool,

    layer_surface: LayerSurface,
    width: u32,
    height: u32,
    configured: bool,
    needs_redraw: bool,

    config: WatchConfig,
    config_path: PathBuf,
    font: FontState,
    assets: FaceAssets,

    // Last tick snapshot; draw() only ever reads these.
    time: WallTime,
    date_rect: Rect,

    ipc_listener: UnixListener,
    ipc_socket_path: PathBuf,

    should_quit: bool,
}

pub fn run(config: WatchConfig, config_path: PathBuf, socket_override: Option<PathBuf>) -> Result<()> {
    let conn = Connection::connect_to_env().context(
        "Failed to connect to Wayland. Ensure a Wayland compositor with wlr-layer-shell support is running."
    )?;

    let (globals, mut event_queue) = registry_queue_init(&conn)
        .context("Failed to initialize Wayland registry")?;
    let qh = event_queue.handle();

    let compositor = CompositorState::bind(&globals, &qh)
        .context("wl_compositor not available")?;
    let layer_shell = LayerShell::bind(&globals, &qh)
        .context("wlr-layer-shell not available. Your compositor must support the wlr_layer_shell_v1 protocol.")?;
    let shm = Shm::bind(&globals, &qh)
        .context("wl_shm not available")?;

    let surface = compositor.create_surface(&qh);
    let layer_surface =
        layer_shell.create_layer_surface(&qh, surface, parse_layer(&config.window.layer), Some("tickface"), None);

    let (init_w, init_h) = renderer::compute_size(&config);
    layer_surface.set_size(init_w, init_h);
    layer_surface.set_anchor(parse_anchor(&config.window.anchor));
    layer_surface.set_margin(
        config.window.margin_top,
        config.window.margin_right,
        config.window.margin_bottom,
        config.window.margin_left,
    );
    layer_surface.set_exclusive_zone(0);
    layer_surface.set_keyboard_interactivity(KeyboardInteractivity::None);
    layer_surface.commit();

    let pool = SlotPool::new((init_w * init_h * 4) as usize, &shm)
        .context("Failed to create SHM pool")?;

    let font = FontState::load(&config.face.font)?;
    let assets = FaceAssets::load(&config, init_w, init_h);

    let ipc_socket_path = ipc::socket_path(socket_override.as_ref());
    let ipc_listener = ipc::create_listener(&ipc_socket_path)?;

    // Lay the face out once so the first frame is complete.
    let time = time_utils::current_time(&config.face.date_format);
    let date_rect = renderer::date::layout(&font, &config, init_w, init_h, &time);

    let mut face = Watchface {
        registry_state: RegistryState::new(&globals),
        output_state: OutputState::new(&globals, &qh),
        shm,
        pool,
        layer_surface,
        width: init_w,
        height: init_h,
        configured: false,
        needs_redraw: true,
        config,
        config_path,
        font,
        assets,
        time,
        date_rect,
        ipc_listener,
        ipc_socket_path,
        should_quit: false,
    };

    // Signal handling
    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })
        .context("Failed to set signal handler")?;
    }

    // Main event loop: dispatch Wayland events, accept control
    // connections, tick once per second.
    let mut last_second: Option<u32> = None;

    loop {
        if face.should_quit || !running.load(Ordering::SeqCst) {
            break;
        }

        event_queue.flush()?;
        if let Some(guard) = event_queue.prepare_read() {
            // Short timeout so the 1 Hz check stays responsive
            let fd = guard.connection_fd();
            let mut fds = [nix::poll::PollFd::new(fd, nix::poll::PollFlags::POLLIN)];
            let _ = nix::poll::poll(&mut fds, nix::poll::PollTimeout::from(100u16));
            if fds[0].revents().map_or(false, |r| r.contains(nix::poll::PollFlags::POLLIN)) {
                guard.read()?;
            } else {
                drop(guard);
            }
        }
        event_queue.dispatch_pending(&mut face)?;

        face.poll_ipc();

        // Second changed: refresh the snapshot and mark the surface dirty.
        // The repaint itself happens below, lazily.
        let now = chrono::Local::now();
        let current_second = chrono::Timelike::second(&now);
        if last_second != Some(current_second) {
            last_second = Some(current_second);
            face.tick();
        }

        if face.configured && face.needs_redraw {
            face.draw();
            face.needs_redraw = false;
        }
    }

    ipc::cleanup_socket(&face.ipc_socket_path);

    Ok(())
}

fn parse_layer(s: &str) -> Layer {
    match s {
        "background" => Layer::Background,
        "bottom" => Layer::Bottom,
        "top" => Layer::Top,
        "overlay" => Layer::Overlay,
        _ => Layer::Top,
    }
}

fn parse_anchor(s: &str) -> Anchor {
    let mut anchor = Anchor::empty();
    for part in s.split_whitespace() {
        match part.to_lowercase().as_str() {
            "top" => anchor |= Anchor::TOP,
            "bottom" => anchor |= Anchor::BOTTOM,
            "left" => anchor |= Anchor::LEFT,
            "right" => anchor |= Anchor::RIGHT,
            _ => {}
        }
    }
    anchor
}

impl Watchface {
    /// Per-second update: refresh the time snapshot and re-place the date
    /// label, then mark the surface dirty.
    fn tick(&mut self) {
        self.time = time_utils::current_time(&self.config.face.date_format);
        self.date_rect =
            renderer::date::layout(&self.font, &self.config, self.width, self.height, &self.time);
        self.needs_redraw = true;
    }

    /// Rebuild size-dependent resources and re-place the date label.
    fn refresh_layout(&mut self) {
        self.assets = FaceAssets::load(&self.config, self.width, self.height);
        self.date_rect =
            renderer::date::layout(&self.font, &self.config, self.width, self.height, &self.time);
        self.needs_redraw = true;
    }

    /// Recompute the surface size from the face config and apply it.
    fn update_size(&mut self) {
        let (new_w, new_h) = renderer::compute_size(&self.config);
        if new_w != self.width || new_h != self.height {
            self.width = new_w;
            self.height = new_h;
            self.layer_surface.set_size(new_w, new_h);
            self.layer_surface.wl_surface().commit();
        }
        self.refresh_layout();
    }

    fn draw(&mut self) {
        let width = self.width;
        let height = self.height;

        if width == 0 || height == 0 {
            return;
        }

        let stride = width as i32 * 4;
        let buf_size = (stride * height as i32) as usize;

        if self.pool.len() < buf_size {
            if let Err(e) = self.pool.resize(buf_size) {
                log::warn!("Failed to resize SHM pool: {}", e);
                return;
            }
        }

        let (buffer, canvas_data) = match self.pool.create_buffer(
            width as i32,
            height as i32,
            stride,
            wl_shm::Format::Argb8888,
        ) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Failed to create buffer: {}", e);
                return;
            }
        };

        let mut canvas = Canvas::new(width, height);
        let state = FaceState {
            config: self.config.clone(),
            time: self.time.clone(),
            date_rect: self.date_rect,
            width,
            height,
        };

        renderer::render(&mut canvas, &state, &self.font, &mut self.assets);

        // Apply window opacity
        let opacity = self.config.window.opacity;
        if opacity < 1.0 {
            let data = canvas.pixmap.data_mut();
            let scale = (opacity * 255.0) as u32;
            for i in (0..data.len()).step_by(4) {
                data[i + 3] = ((data[i + 3] as u32 * scale) / 255) as u8;
            }
        }

        // Copy pixels with RGBA→BGRA swizzle
        let pixels = canvas.pixels_argb8888();
        canvas_data[..pixels.len()].copy_from_slice(&pixels);

        let surface = self.layer_surface.wl_surface();
        if let Err(e) = buffer.attach_to(surface) {
            log::warn!("Failed to attach buffer: {}", e);
            return;
        }
        surface.damage_buffer(0, 0, width as i32, height as i32);
        surface.commit();
    }

    fn poll_ipc(&mut self) {
        loop {
            match self.ipc_listener.accept() {
                Ok((stream, _)) => {
                    self.handle_ipc_connection(stream);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("IPC accept error: {}", e);
                    break;
                }
            }
        }
    }

    fn handle_ipc_connection(&mut self, stream: std::os::unix::net::UnixStream) {
        let cmd = match ipc::read_command(&stream) {
            Ok(cmd) => cmd,
            Err(e) => {
                log::warn!("IPC read error: {}", e);
                return;
            }
        };

        let response = self.handle_command(cmd);
        let mut stream = stream;
        if let Err(e) = ipc::write_response(&mut stream, &response) {
            log::warn!("IPC write error: {}", e);
        }
    }

    fn set_shape(&mut self, shape: DisplayShape) {
        self.config.face.shape = shape;
        config::save_shape_to_config(&self.config_path, shape);
        self.update_size();
    }

    fn handle_command(&mut self, cmd: ipc::IpcCommand) -> ipc::IpcResponse {
        match cmd {
            ipc::IpcCommand::SetShape { shape } => match DisplayShape::parse(&shape) {
                Some(shape) => {
                    self.set_shape(shape);
                    ipc::IpcResponse::ok()
                }
                None => ipc::IpcResponse::err(format!("Unknown shape: {}", shape)),
            },
            ipc::IpcCommand::ToggleShape => {
                self.set_shape(self.config.face.shape.toggle());
                ipc::IpcResponse::ok()
            }
            ipc::IpcCommand::ReloadConfig => {
                match config::load_config(&self.config_path) {
                    Ok(new_config) => {
                        let font = match FontState::load(&new_config.face.font) {
                            Ok(f) => f,
                            Err(e) => return ipc::IpcResponse::err(format!("Font load failed: {}", e)),
                        };

                        self.layer_surface.set_anchor(parse_anchor(&new_config.window.anchor));
                        self.layer_surface.set_margin(
                            new_config.window.margin_top,
                            new_config.window.margin_right,
                            new_config.window.margin_bottom,
                            new_config.window.margin_left,
                        );

                        self.config = new_config;
                        self.font = font;
                        self.update_size();
                        self.layer_surface.wl_surface().commit();
                        ipc::IpcResponse::ok()
                    }
                    Err(e) => ipc::IpcResponse::err(format!("Config reload failed: {}", e)),
                }
            }
            ipc::IpcCommand::GetState => ipc::IpcResponse::state(
                self.config.face.shape.as_str(),
                self.width,
                self.height,
                &self.config_path.to_string_lossy(),
            ),
            ipc::IpcCommand::Quit => {
                self.should_quit = true;
                ipc::IpcResponse::ok()
            }
        }
    }
}

// SCTK handler implementations

impl CompositorHandler for Watchface {
    fn scale_factor_changed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _new_factor: i32) {
        self.needs_redraw = true;
    }

    fn transform_changed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _new_transform: wl_output::Transform) {
        self.needs_redraw = true;
    }

    fn frame(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _time: u32) {}

    fn surface_enter(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _output: &wl_output::WlOutput) {}

    fn surface_leave(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _surface: &wl_surface::WlSurface, _output: &wl_output::WlOutput) {}
}

impl LayerShellHandler for Watchface {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        self.should_quit = true;
    }

    fn configure(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface, configure: LayerSurfaceConfigure, _serial: u32) {
        let (new_w, new_h) = configure.new_size;
        let resized = (new_w > 0 && new_w != self.width) || (new_h > 0 && new_h != self.height);
        if new_w > 0 {
            self.width = new_w;
        }
        if new_h > 0 {
            self.height = new_h;
        }
        self.configured = true;
        if resized {
            self.refresh_layout();
        }
        self.needs_redraw = true;
    }
}

impl OutputHandler for Watchface {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn update_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn output_destroyed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
}

impl ShmHandler for Watchface {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm
    }
}

impl ProvidesRegistryState for Watchface {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    registry_handlers![OutputState];
}

delegate_compositor!(Watchface);
delegate_layer!(Watchface);
delegate_output!(Watchface);
delegate_registry!(Watchface);
delegate_shm!(Watchface);
