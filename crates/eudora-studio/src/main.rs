use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use winit::dpi::LogicalSize;

use eudora_engine::coords::Vec2;
use eudora_engine::core::{App, AppControl, FastSender, FastUpdate, FrameCtx};
use eudora_engine::device::GpuInit;
use eudora_engine::input::{EventInfo, EventSystem, EventType, KeyCode, ListenerId, ListenerOptions};
use eudora_engine::logging::{init_logging, LoggingConfig};
use eudora_engine::render::GpuDevice;
use eudora_engine::text::{Alignment, DocSettings, ParaSettings, TextEngine, TextSettings};
use eudora_engine::window::{Runtime, RuntimeConfig};

const ITEMS: [&str; 3] = ["New game", "Options", "Quit"];
const NEW_GAME: usize = 0;
const QUIT: usize = 2;

/// NDC distance the player moves per frame while a direction key is held.
const PLAYER_STEP: f32 = 0.01;

/// State shared between listeners and the app.
#[derive(Debug, Default)]
struct Scene {
    selected: usize,
    chosen: Option<usize>,
    clicks: u32,
    player: Vec2,
    leave_game: bool,
}

impl Scene {
    fn step(&mut self, delta: isize) {
        let len = ITEMS.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }
}

struct Studio {
    font_path: PathBuf,
    text: TextEngine,
    scene: Rc<RefCell<Scene>>,
    /// Listeners of the game layer; empty while the menu is showing.
    game_layer: Vec<ListenerId>,
    ticks: u64,
}

impl App for Studio {
    type Message = u64;

    fn on_start(&mut self, events: &mut EventSystem, device: &mut dyn GpuDevice) -> anyhow::Result<()> {
        self.text
            .submit_font(device, &self.font_path, 48)
            .with_context(|| format!("loading {}", self.font_path.display()))?;

        let scene = Rc::clone(&self.scene);
        events.add_event_listener(
            EventType::KeyDown,
            move |info: &EventInfo<'_>| {
                let mut scene = scene.borrow_mut();
                match info.key() {
                    Some(KeyCode::UP) | Some(KeyCode::W) => scene.step(-1),
                    Some(KeyCode::DOWN) | Some(KeyCode::S) => scene.step(1),
                    Some(KeyCode::RETURN) => {
                        let selected = scene.selected;
                        scene.chosen = Some(selected);
                    }
                    Some(KeyCode::ESCAPE) => scene.chosen = Some(QUIT),
                    _ => {}
                }
            },
            ListenerOptions::default().with_priority(20),
        );

        events.add_event_listener(
            EventType::KeyDown,
            |info: &EventInfo<'_>| log::trace!("unmasked key {:?}", info.key()),
            ListenerOptions::default().with_mask(false),
        );

        let scene = Rc::clone(&self.scene);
        events.add_event_listener(
            EventType::MouseWheel,
            move |info: &EventInfo<'_>| match info.as_mouse() {
                Some(mouse) if mouse.wheel_y != 0.0 => {
                    scene.borrow_mut().step(-mouse.wheel_y.signum() as isize);
                }
                _ => {}
            },
            ListenerOptions::default(),
        );

        let scene = Rc::clone(&self.scene);
        events.add_event_listener(
            EventType::MouseDownLeft,
            move |_: &EventInfo<'_>| {
                let mut scene = scene.borrow_mut();
                let selected = scene.selected;
                scene.clicks += 1;
                scene.chosen = Some(selected);
            },
            ListenerOptions::default(),
        );
        Ok(())
    }

    fn on_message(&mut self, ticks: u64) {
        self.ticks = ticks;
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let (chosen, leave_game) = {
            let mut scene = self.scene.borrow_mut();
            (scene.chosen.take(), std::mem::take(&mut scene.leave_game))
        };

        if leave_game {
            self.leave_game(ctx.events);
        }
        match chosen {
            Some(QUIT) => return AppControl::Exit,
            Some(NEW_GAME) if self.game_layer.is_empty() => self.enter_game(ctx.events),
            Some(choice) => log::info!("menu choice: {}", ITEMS[choice]),
            None => {}
        }

        ctx.clear(0.93, 0.92, 0.88);
        let rendered = if self.game_layer.is_empty() {
            self.render_menu(ctx)
        } else {
            self.render_game(ctx)
        };
        if let Err(err) = rendered {
            log::error!("text rendering failed: {err:#}");
            return AppControl::Exit;
        }
        AppControl::Continue
    }
}

impl Studio {
    /// Pushes the game layer. Its key-down listener outranks and masks the menu's.
    fn enter_game(&mut self, events: &mut EventSystem) {
        let layer = ListenerOptions::default().with_priority(30);

        let scene = Rc::clone(&self.scene);
        let hold = events.add_event_listener(
            EventType::KeyHold,
            move |info: &EventInfo<'_>| {
                let mut scene = scene.borrow_mut();
                match info.key() {
                    Some(KeyCode::LEFT) | Some(KeyCode::A) => scene.player.x -= PLAYER_STEP,
                    Some(KeyCode::RIGHT) | Some(KeyCode::D) => scene.player.x += PLAYER_STEP,
                    Some(KeyCode::UP) | Some(KeyCode::W) => scene.player.y += PLAYER_STEP,
                    Some(KeyCode::DOWN) | Some(KeyCode::S) => scene.player.y -= PLAYER_STEP,
                    _ => {}
                }
                scene.player.x = scene.player.x.clamp(-0.95, 0.9);
                scene.player.y = scene.player.y.clamp(-0.9, 0.7);
            },
            layer,
        );

        let scene = Rc::clone(&self.scene);
        let keys = events.add_event_listener(
            EventType::KeyDown,
            move |info: &EventInfo<'_>| {
                if info.key() == Some(KeyCode::ESCAPE) {
                    scene.borrow_mut().leave_game = true;
                }
            },
            layer,
        );

        self.scene.borrow_mut().player = Vec2::zero();
        self.game_layer = vec![hold.id, keys.id];
        log::info!("entered game layer");
    }

    fn leave_game(&mut self, events: &mut EventSystem) {
        for id in self.game_layer.drain(..) {
            events.remove_event_listener(id);
        }
        log::info!("back to menu");
    }

    fn render_menu(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        let doc = DocSettings {
            margin_top: 0.1,
            margin_left: 0.05,
            ..DocSettings::default()
        };
        self.text.begin_document(&doc, ctx.viewport)?;

        let title = ParaSettings {
            width: 1.9,
            alignment: Alignment::Center,
            padding_bottom: 0.1,
            text: TextSettings {
                font_size: 0.08,
                line_height: 0.2,
                color: [0.15, 0.2, 0.35],
                ..TextSettings::default()
            },
            ..ParaSettings::default()
        };
        self.text.paragraph_with("eudora studio", &title)?;

        let scene = self.scene.borrow();
        for (i, item) in ITEMS.iter().enumerate() {
            let selected = i == scene.selected;
            let para = ParaSettings {
                width: 1.9,
                alignment: Alignment::Center,
                text: TextSettings {
                    font_size: 0.05,
                    line_height: 0.12,
                    color: if selected { [0.8, 0.3, 0.1] } else { [0.3; 3] },
                    italic: selected,
                    ..TextSettings::default()
                },
                ..ParaSettings::default()
            };
            self.text.paragraph_with(item, &para)?;
        }

        let status = format!(
            "frame {}\tclicks {}\tworker ticks {}\nup/down or wheel to move, enter or click to pick",
            ctx.time.frame_index, scene.clicks, self.ticks
        );
        drop(scene);
        self.text.paragraph_with(&status, &status_para())?;

        self.text.end_document(ctx.device)?;
        self.text.draw_document(ctx.device)?;
        Ok(())
    }

    fn render_game(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
        self.text.begin_document(&DocSettings::default(), ctx.viewport)?;
        self.text.paragraph_with(
            "arrows or WASD to move\tesc for the menu",
            &status_para(),
        )?;

        let player = self.scene.borrow().player;
        self.text.set_cursor(player);
        self.text.text_block_with(
            "@",
            &TextSettings {
                font_size: 0.06,
                color: [0.1, 0.45, 0.2],
                ..TextSettings::default()
            },
        )?;

        self.text.end_document(ctx.device)?;
        self.text.draw_document(ctx.device)?;
        Ok(())
    }
}

fn status_para() -> ParaSettings {
    ParaSettings {
        padding_top: 0.2,
        text: TextSettings {
            font_size: 0.025,
            line_height: 0.07,
            opacity: 0.7,
            ..TextSettings::default()
        },
        ..ParaSettings::default()
    }
}

/// Counts its own iterations at a fixed rate, independent of frame pacing.
struct Ticker {
    count: u64,
}

impl FastUpdate for Ticker {
    type Message = u64;

    fn fast_update(&mut self, _dt: Duration, tx: &FastSender<u64>) -> AppControl {
        std::thread::sleep(Duration::from_millis(10));
        self.count += 1;
        // A dropped count is superseded by the next one.
        let _ = tx.try_send(self.count);
        AppControl::Continue
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default().with_filter("info,wgpu_core=warn,wgpu_hal=warn"));

    let font_path = font_path().context("no font given and no system font found")?;
    let studio = Studio {
        font_path,
        text: TextEngine::new(),
        scene: Rc::new(RefCell::new(Scene::default())),
        game_layer: Vec::new(),
        ticks: 0,
    };

    let config = RuntimeConfig {
        title: "eudora studio".to_string(),
        initial_size: LogicalSize::new(960.0, 640.0),
        ..RuntimeConfig::default()
    };
    Runtime::run_with_fast_update(config, GpuInit::default(), studio, Ticker { count: 0 })
}

/// First CLI argument, else the first system font found.
fn font_path() -> Option<PathBuf> {
    if let Some(arg) = std::env::args_os().nth(1) {
        return Some(PathBuf::from(arg));
    }
    [
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    ]
    .into_iter()
    .map(PathBuf::from)
    .find(|p| p.is_file())
}
