use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FastLoop, FastUpdate, FrameCtx};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::input::platform::winit::WinitTranslator;
use crate::input::{EventSystem, RawEvent, WindowSize};
use crate::render::{RenderTarget, WgpuDevice};
use crate::time::FrameClock;

/// Window and fast-update configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Bound of the fast-update channel.
    pub fast_update_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "eudora".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            fast_update_capacity: 64,
        }
    }
}

/// Entry point for the main loop.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until it exits or the window closes.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        Self::launch(config, gpu_init, app, None)
    }

    /// Like [`run`](Self::run), with `fast` running on its own thread and
    /// feeding `App::on_message`.
    pub fn run_with_fast_update<A, F>(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        app: A,
        fast: F,
    ) -> Result<()>
    where
        A: App + 'static,
        F: FastUpdate<Message = A::Message>,
    {
        let fast = FastLoop::spawn(fast, config.fast_update_capacity)
            .context("failed to spawn fast update thread")?;
        Self::launch(config, gpu_init, app, Some(fast))
    }

    fn launch<A>(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        app: A,
        fast: Option<FastLoop<A::Message>>,
    ) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app, fast);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.startup_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A: App> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    events: EventSystem,
    translator: WinitTranslator,
    pending: Vec<RawEvent>,
    /// Last non-zero drawable size, used for polling while minimized.
    window_size: WindowSize,
    clock: FrameClock,
    fast: Option<FastLoop<A::Message>>,

    entry: Option<WindowEntry>,
    device: Option<WgpuDevice>,
    startup_error: Option<anyhow::Error>,
}

impl<A: App> AppState<A> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A, fast: Option<FastLoop<A::Message>>) -> Self {
        Self {
            config,
            gpu_init,
            app,
            events: EventSystem::new(),
            translator: WinitTranslator::new(),
            pending: Vec::new(),
            window_size: WindowSize::new(1, 1),
            clock: FrameClock::new(),
            fast,
            entry: None,
            device: None,
            startup_error: None,
        }
    }

    /// Creates the window and GPU, then hands both to `App::on_start`.
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let size = entry.borrow_gpu().size();
        self.window_size = WindowSize::new(size.width.max(1), size.height.max(1));
        let mut device = entry.borrow_gpu().create_device();
        self.app
            .on_start(&mut self.events, &mut device)
            .context("application start failed")?;

        entry.borrow_window().request_redraw();
        self.entry = Some(entry);
        self.device = Some(device);
        self.clock.reset();
        Ok(())
    }

    /// One iteration: reset, poll, quit check, resolve, drain fast messages,
    /// `on_frame`, then encode queued draws and present.
    ///
    /// Input is pumped even while the window is minimized; only rendering
    /// waits for a non-zero size.
    fn frame(&mut self) -> AppControl {
        let (Some(entry), Some(device)) = (self.entry.as_mut(), self.device.as_mut()) else {
            return AppControl::Continue;
        };
        let size = entry.borrow_gpu().size();
        let visible = size.width > 0 && size.height > 0;
        if visible {
            self.window_size = WindowSize::new(size.width, size.height);
        }

        if pump_input(&mut self.events, &mut self.pending, self.window_size) == AppControl::Exit {
            return AppControl::Exit;
        }

        if let Some(fast) = &self.fast {
            for msg in fast.drain() {
                self.app.on_message(msg);
            }
        }
        if !visible {
            return AppControl::Continue;
        }

        let time = self.clock.tick();
        let (app, events) = (&mut self.app, &mut self.events);

        entry.with_mut(|fields| {
            let gpu = fields.gpu;
            let mut frame = match gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    if gpu.handle_surface_error(err.clone()) == SurfaceErrorAction::Fatal {
                        log::error!("cannot acquire surface texture: {err}");
                        return AppControl::Exit;
                    }
                    return AppControl::Continue;
                }
            };

            let control = {
                let mut ctx = FrameCtx {
                    events,
                    device: &mut *device,
                    target: RenderTarget::new(&mut frame.encoder, &frame.view),
                    time,
                    viewport: gpu.viewport(),
                };
                app.on_frame(&mut ctx)
            };

            device.flush(&mut frame.encoder, &frame.view);
            fields.window.pre_present_notify();
            gpu.submit(frame);
            control
        })
    }
}

impl<A: App> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            log::error!("failed to start: {err:#}");
            self.startup_error = Some(err);
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        let Some(entry) = &self.entry else {
            return;
        };
        let size = entry.borrow_gpu().size();
        if size.width > 0 && size.height > 0 {
            entry.borrow_window().request_redraw();
        } else if self.frame() == AppControl::Exit {
            // Minimized windows may never see a redraw; pump input from here.
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::Resized(size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*size));
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let size = entry.borrow_window().inner_size();
                    entry.with_gpu_mut(|gpu| gpu.resize(size));
                }
            }
            WindowEvent::RedrawRequested => {
                if self.frame() == AppControl::Exit {
                    event_loop.exit();
                }
                return;
            }
            _ => {}
        }

        if let Some(raw) = self.translator.translate(&event) {
            self.pending.push(raw);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut fast) = self.fast.take() {
            fast.shutdown();
        }
        self.device = None;
        self.entry = None;
    }
}

/// Input half of a frame: reset the control word, poll everything buffered,
/// check for quit, then resolve listeners. `pending` is always emptied.
fn pump_input(events: &mut EventSystem, pending: &mut Vec<RawEvent>, window: WindowSize) -> AppControl {
    events.reset_control_word();
    events.poll(Some(window), pending.drain(..));
    if events.should_quit() {
        return AppControl::Exit;
    }
    events.resolve();
    AppControl::Continue
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::input::{EventType, KeyCode, ListenerOptions};

    // ── input pump ──

    #[test]
    fn quit_is_seen_while_minimized() {
        let mut events = EventSystem::new();
        // A minimized window polls with the last size it had.
        let mut pending = vec![RawEvent::MouseMotion { x: 4, y: 4, xrel: 0, yrel: 0 }, RawEvent::Quit];
        let control = pump_input(&mut events, &mut pending, WindowSize::new(800, 600));
        assert_eq!(control, AppControl::Exit);
        assert!(pending.is_empty());
    }

    #[test]
    fn pumped_events_reach_listeners() {
        let mut events = EventSystem::new();
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        events.add_event_listener(
            EventType::KeyDown,
            move |_| seen.set(seen.get() + 1),
            ListenerOptions::default(),
        );

        let mut pending = vec![RawEvent::KeyDown(KeyCode::A)];
        let control = pump_input(&mut events, &mut pending, WindowSize::new(800, 600));
        assert_eq!(control, AppControl::Continue);
        assert_eq!(hits.get(), 1);
        assert!(pending.is_empty());

        // Nothing buffered: nothing fires again.
        pump_input(&mut events, &mut pending, WindowSize::new(800, 600));
        assert_eq!(hits.get(), 1);
    }
}
