//! Breakout Bridge entry point
//!
//! On the web: mounts the bridge between the logic component element and the
//! canvas, then drives it from requestAnimationFrame. Natively: runs a
//! headless session against the scripted logic component.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CustomEvent, CustomEventInit, Document, Element, HtmlCanvasElement};

    use breakout_bridge::bridge::{HostEnvironment, LogicEndpoint, Session, SnapshotPublisher};
    use breakout_bridge::renderer::{PlaceholderScene, RenderState};
    use breakout_bridge::{BridgeSettings, RawMessage, WireShape};

    /// Event the logic component fires with each state message
    const STATE_EVENT: &str = "logic-state";
    /// Event fired on the logic component for each frame tick
    const TICK_EVENT: &str = "frame-advance";
    /// Event fired on the logic component for each non-fatal bridge error
    const ERROR_EVENT: &str = "bridge-error";

    /// Host queries answered from the live DOM
    struct DomHost {
        document: Document,
    }

    impl DomHost {
        fn canvas(&self, selector: &str) -> Option<HtmlCanvasElement> {
            self.document
                .query_selector(selector)
                .ok()
                .flatten()
                .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        }
    }

    impl HostEnvironment for DomHost {
        fn surface_size(&self, selector: &str) -> Option<(f32, f32)> {
            let canvas = self.canvas(selector)?;
            let (w, h) = (canvas.client_width(), canvas.client_height());
            (w > 0 && h > 0).then_some((w as f32, h as f32))
        }

        fn has_mount(&self, selector: &str) -> bool {
            self.document.query_selector(selector).ok().flatten().is_some()
        }
    }

    /// Everything the frame loop touches
    struct App {
        session: Session<PlaceholderScene>,
        endpoint: LogicEndpoint,
        mount: Element,
        canvas: HtmlCanvasElement,
        render_state: Option<RenderState>,
        show_fps: bool,
    }

    impl App {
        fn frame(&mut self, time: f64) {
            if self.session.frame(time).is_none() {
                return;
            }

            // Forward ticks to the logic component; it may answer synchronously
            for _ in 0..self.endpoint.drain_ticks() {
                match CustomEvent::new(TICK_EVENT) {
                    Ok(event) => {
                        let _ = self.mount.dispatch_event(&event);
                    }
                    Err(e) => log::warn!("Cannot create {} event: {:?}", TICK_EVENT, e),
                }
            }
            self.session.pump();

            self.render();
        }

        fn render(&mut self) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(self.session.sink()) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let (w, h) = render_state.size;
                        let logical = render_state.logical_size;
                        render_state.resize(w, h, logical);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        fn resize(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let dpr = window.device_pixel_ratio();
            let client_w = self.canvas.client_width();
            let client_h = self.canvas.client_height();
            let width = (client_w as f64 * dpr) as u32;
            let height = (client_h as f64 * dpr) as u32;
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(width, height, (client_w as f32, client_h as f32));
            }
        }

        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let stats = self.session.stats();

            if self.show_fps {
                if let Some(el) = document.query_selector("#hud-fps .hud-value").ok().flatten() {
                    el.set_text_content(Some(&stats.fps.to_string()));
                }
            }
            if let Some(el) = document.query_selector("#hud-bricks .hud-value").ok().flatten() {
                let bricks = self.session.reconciler().brick_count();
                el.set_text_content(Some(&bricks.to_string()));
            }
            if let Some(el) = document.query_selector("#hud-errors .hud-value").ok().flatten() {
                let errors = stats.decode_errors + stats.sink_errors;
                el.set_text_content(Some(&errors.to_string()));
            }
        }
    }

    /// `?shape=G2` overrides the configured wire shape
    fn shape_from_query(window: &web_sys::Window) -> Option<WireShape> {
        let search = window.location().search().ok()?;
        search
            .trim_start_matches('?')
            .split('&')
            .find_map(|pair| pair.strip_prefix("shape="))
            .and_then(WireShape::from_str)
    }

    /// Turn a `logic-state` event detail into a raw message
    fn detail_to_message(detail: &JsValue) -> Option<RawMessage> {
        if let Some(text) = detail.as_string() {
            return Some(RawMessage::Text(text));
        }
        if let Some(n) = detail.as_f64() {
            return Some(RawMessage::Text(n.to_string()));
        }
        let json: String = js_sys::JSON::stringify(detail).ok()?.into();
        match serde_json::from_str(&json) {
            Ok(value) => Some(RawMessage::Structured(value)),
            Err(_) => Some(RawMessage::Text(json)),
        }
    }

    fn attach_state_listener(mount: &Element, publisher: SnapshotPublisher) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
            let Ok(event) = event.dyn_into::<CustomEvent>() else {
                return;
            };
            if let Some(msg) = detail_to_message(&event.detail()) {
                publisher.publish(msg);
            }
        });
        let _ = mount
            .add_event_listener_with_callback(STATE_EVENT, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn attach_resize_listener(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().resize();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Breakout Bridge starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let mut settings = BridgeSettings::load();
        if let Some(shape) = shape_from_query(&window) {
            log::info!("Wire shape {} from URL", shape.as_str());
            settings.wire_shape = shape;
        }

        let host = DomHost { document };
        let scene = PlaceholderScene::new(settings.max_visuals);
        let (mut session, endpoint) = match Session::start(&settings, &host, scene) {
            Ok(started) => started,
            Err(e) => {
                log::error!("Bridge startup failed: {}", e);
                return;
            }
        };

        // Both lookups succeeded inside Session::start
        let canvas = host.canvas(&settings.render_mount).expect("no canvas");
        let mount = host
            .document
            .query_selector(&settings.logic_mount)
            .ok()
            .flatten()
            .expect("no logic mount");

        {
            let mount = mount.clone();
            session.set_error_hook(move |e| {
                let init = CustomEventInit::new();
                init.set_detail(&JsValue::from_str(&e.to_string()));
                if let Ok(event) = CustomEvent::new_with_event_init_dict(ERROR_EVENT, &init) {
                    let _ = mount.dispatch_event(&event);
                }
            });
        }

        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let logical = (client_w as f32, client_h as f32);
        let render_state = match RenderState::new(surface, &adapter, width, height, logical).await
        {
            Ok(state) => Some(state),
            Err(e) => {
                log::error!("No GPU device, running without drawing: {}", e);
                None
            }
        };

        attach_state_listener(&mount, endpoint.publisher());

        let app = Rc::new(RefCell::new(App {
            session,
            endpoint,
            mount,
            canvas,
            render_state,
            show_fps: settings.show_fps,
        }));
        attach_resize_listener(app.clone());

        request_animation_frame(app);

        log::info!("Breakout Bridge running!");
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();
            a.frame(time);
            a.update_hud();
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Breakout Bridge (native) starting...");

    if let Err(e) = native::run(std::env::args().skip(1)) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use breakout_bridge::demo::{ScriptedLogic, random_shape};
    use breakout_bridge::renderer::PlaceholderScene;
    use breakout_bridge::{BridgeSettings, EntityKind, HeadlessHost, Session, WireShape};

    const SURFACE: (f32, f32) = (800.0, 600.0);

    struct Args {
        frames: u64,
        shape: Option<WireShape>,
        random_shape: bool,
        seed: u64,
        emit_every: u32,
    }

    fn parse_args(args: impl Iterator<Item = String>) -> Result<Args, String> {
        let mut parsed = Args {
            frames: 600,
            shape: None,
            random_shape: false,
            seed: 42,
            emit_every: 1,
        };
        let mut args = args;
        while let Some(flag) = args.next() {
            let mut value = || args.next().ok_or_else(|| format!("{flag} needs a value"));
            match flag.as_str() {
                "--frames" => {
                    parsed.frames = value()?.parse().map_err(|e| format!("--frames: {e}"))?
                }
                "--seed" => parsed.seed = value()?.parse().map_err(|e| format!("--seed: {e}"))?,
                "--emit-every" => {
                    parsed.emit_every = value()?.parse().map_err(|e| format!("--emit-every: {e}"))?
                }
                "--shape" => {
                    let v = value()?;
                    if v.eq_ignore_ascii_case("random") {
                        parsed.random_shape = true;
                    } else {
                        parsed.shape = Some(
                            WireShape::from_str(&v).ok_or_else(|| format!("unknown shape {v}"))?,
                        );
                    }
                }
                other => return Err(format!("unknown argument {other}")),
            }
        }
        Ok(parsed)
    }

    pub fn run(args: impl Iterator<Item = String>) -> Result<(), String> {
        let args = parse_args(args)?;
        let mut settings = BridgeSettings::load();
        if args.random_shape {
            let mut rng = Pcg32::seed_from_u64(args.seed);
            settings.wire_shape = random_shape(&mut rng);
        } else if let Some(shape) = args.shape {
            settings.wire_shape = shape;
        }

        let host = HeadlessHost::new()
            .with_surface(&settings.render_mount, SURFACE.0, SURFACE.1)
            .with_mount(&settings.logic_mount);
        let scene = PlaceholderScene::new(settings.max_visuals);
        let (mut session, endpoint) =
            Session::start(&settings, &host, scene).map_err(|e| e.to_string())?;
        session.set_error_hook(|e| log::debug!("Bridge error: {}", e));

        let transform = settings.transforms.for_shape(settings.wire_shape);
        let mut logic =
            ScriptedLogic::new(endpoint, settings.wire_shape, transform, SURFACE, args.seed)
                .with_emit_every(args.emit_every);
        log::info!(
            "Running {} frames, {} messages, seed {}",
            args.frames,
            logic.shape().as_str(),
            args.seed
        );

        let frame_ms = 1000.0 / 60.0;
        for i in 0..args.frames {
            session.frame(i as f64 * frame_ms);
            logic.step();
            session.pump();

            if (i + 1) % 60 == 0 {
                let stats = session.stats();
                let scene = session.sink();
                log::info!(
                    "frame {}: {} applied, {} dropped, {} bricks ({} in scene), paddle {}, ball {}",
                    stats.frames,
                    stats.applied,
                    stats.decode_errors,
                    session.reconciler().brick_count(),
                    scene.count(EntityKind::Brick),
                    scene.count(EntityKind::Paddle),
                    scene.count(EntityKind::Ball),
                );
            }
        }

        let stats = session.stats();
        log::info!(
            "Done: {} frames, {} ticks, {} messages, {} applied, {} decode errors, {} sink errors",
            stats.frames,
            stats.ticks_sent,
            stats.messages,
            stats.applied,
            stats.decode_errors,
            stats.sink_errors
        );
        Ok(())
    }
}
