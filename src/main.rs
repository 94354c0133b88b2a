//! Lane Racer entry point
//!
//! In the browser this wires the DOM, input, audio and both frame loops to
//! the simulation. Natively it runs a headless autopilot race.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, Element, HtmlCanvasElement, HtmlInputElement, KeyboardEvent, MouseEvent,
        TouchEvent,
    };

    use lane_racer::audio::{AudioManager, MusicMixer, MusicPlayer, SoundEffect};
    use lane_racer::fireworks::{FireworksDirector, FireworksTuning};
    use lane_racer::platform::web::run_frame_loop;
    use lane_racer::platform::{Schedule, StopFlag};
    use lane_racer::renderer::{CanvasPainter, shapes};
    use lane_racer::sim::{Arena, GameEvent, GameState, autopilot};
    use lane_racer::ui::{self, ScreenText};
    use lane_racer::{DeviceProfile, Settings, Tuning};

    /// Victory overlay and its fireworks, torn down together
    struct Celebration {
        overlay: Element,
        canvas: Option<HtmlCanvasElement>,
        stop: StopFlag,
    }

    impl Celebration {
        fn dismiss(self) {
            self.stop.stop();
            if let Some(canvas) = self.canvas {
                canvas.remove();
            }
            self.overlay.remove();
            log::info!("Victory screen dismissed");
        }
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        painter: CanvasPainter,
        mixer: MusicMixer,
        music: MusicPlayer,
        sfx: AudioManager,
        settings: Settings,
        profile: DeviceProfile,
        last_time: Option<f64>,
        /// Window lost focus; the race clock is frozen
        paused: bool,
        /// Autopilot drives
        demo: bool,
        held_left: bool,
        held_right: bool,
        celebration: Option<Celebration>,
    }

    impl Game {
        /// One display frame. Returns the events the simulation raised.
        fn frame(&mut self, time: f64) -> Vec<GameEvent> {
            let dt = self.last_time.map_or(0.0, |last| (time - last) as f32);
            self.last_time = Some(time);

            if !self.paused && self.state.is_running() {
                if self.demo {
                    self.state.input = autopilot::steer(&self.state);
                }
                self.state.advance(dt);
            }

            for track in self.music.take_failed() {
                self.mixer.mark_stopped(track);
            }
            let commands = self.mixer.update(dt);
            self.music.apply(&commands);

            self.render();
            self.state.drain_events()
        }

        fn render(&self) {
            let kmh = self.state.speed_kmh();
            let hud_speed = (self.profile == DeviceProfile::Desktop).then_some(kmh);
            self.painter
                .paint(&shapes::scene(&self.state.snapshot(), hud_speed));
            set_text("speedDisplay", &ui::speed_value(kmh));
        }

        fn start_race(&mut self) {
            if let Some(celebration) = self.celebration.take() {
                celebration.dismiss();
            }
            self.state.reset();
            self.state.start();
            self.held_left = false;
            self.held_right = false;
            self.last_time = None;
            self.paused = false;

            self.sfx.resume();
            self.mixer.start_race();
            hide_screen();
            set_text(
                "scoreDisplay",
                &ui::score_text(self.state.score, self.state.target_score),
            );
        }

        fn apply_keys(&mut self) {
            if !self.demo {
                self.state
                    .set_horizontal_intent(self.held_left, self.held_right);
            }
        }

        /// Canvas x from a viewport x, accounting for CSS scaling
        fn canvas_x(&self, client_x: f64) -> f32 {
            let canvas = self.painter.canvas();
            let rect = canvas.get_bounding_client_rect();
            let css_width = rect.width().max(1.0);
            ((client_x - rect.left()) * canvas.width() as f64 / css_width) as f32
        }

        fn steer_to_client_x(&mut self, client_x: f64) {
            if self.demo {
                return;
            }
            let x = self.canvas_x(client_x);
            self.state.set_pointer_target_x(x);
        }

        fn resize(&mut self) {
            let Some(container) = element("gameContainer") else {
                return;
            };
            let arena = Arena::fit(
                container.client_width() as f32,
                container.client_height() as f32,
            );
            self.painter.resize(&arena);
            self.state.resize(arena);
            self.render();
        }

        fn toggle_mute(&mut self) -> bool {
            let muted = self.settings.toggle_mute();
            let commands = self.mixer.set_muted(muted);
            self.music.apply(&commands);
            self.sfx.set_muted(muted);
            self.settings.save();
            muted
        }

        fn set_volume_percent(&mut self, percent: f32) {
            self.settings.set_volume_percent(percent);
            let commands = self.mixer.set_volume(self.settings.volume);
            self.music.apply(&commands);
            self.sfx.set_volume(self.settings.volume);
            self.settings.save();
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn element(id: &str) -> Option<Element> {
        document()?.get_element_by_id(id)
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = element(id) {
            el.set_text_content(Some(text));
        }
    }

    fn screen_html(screen: &ScreenText, button_id: &str) -> String {
        let lines = screen
            .lines
            .iter()
            .map(|line| format!("<p>{line}</p>"))
            .collect::<String>();
        format!(
            r#"<h1 class="game-title">{}</h1><div class="quote">{}</div><button class="start-button" id="{}">{}</button>"#,
            screen.title, lines, button_id, screen.button
        )
    }

    fn on_click(el: &Element, game: &Rc<RefCell<Game>>) {
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            game.borrow_mut().start_race();
        });
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Fill the start screen overlay and show it
    fn show_screen(game: &Rc<RefCell<Game>>, screen: &ScreenText) {
        let Some(overlay) = element("startScreen") else {
            log::warn!("#startScreen missing; cannot show {:?}", screen.title);
            return;
        };
        overlay.set_inner_html(&screen_html(screen, "startButton"));
        let _ = overlay.class_list().remove_1("hidden");
        if let Some(button) = element("startButton") {
            on_click(&button, game);
        }
    }

    fn hide_screen() {
        if let Some(overlay) = element("startScreen") {
            let _ = overlay.class_list().add_1("hidden");
        }
    }

    /// Victory overlay plus, if enabled, a fireworks canvas on its own loop
    fn show_victory(game: &Rc<RefCell<Game>>, score: u32, target: u32) {
        let Some(document) = document() else { return };
        let Some(container) = element("gameContainer") else {
            log::warn!("#gameContainer missing; skipping victory screen");
            return;
        };
        let Ok(overlay) = document.create_element("div") else {
            return;
        };
        overlay.set_class_name("celebration");
        overlay.set_inner_html(&screen_html(
            &ui::victory_screen(score, target),
            "celebrationButton",
        ));
        let _ = container.append_child(&overlay);
        if let Some(button) = element("celebrationButton") {
            on_click(&button, game);
        }

        let (fireworks_on, profile) = {
            let g = game.borrow();
            (g.settings.fireworks, g.profile)
        };
        let stop = StopFlag::new();
        let canvas = if fireworks_on {
            start_fireworks(&document, &container, profile, &stop)
        } else {
            None
        };

        game.borrow_mut().celebration = Some(Celebration {
            overlay,
            canvas,
            stop,
        });
    }

    fn start_fireworks(
        document: &Document,
        container: &Element,
        profile: DeviceProfile,
        stop: &StopFlag,
    ) -> Option<HtmlCanvasElement> {
        let canvas: HtmlCanvasElement = document.create_element("canvas").ok()?.dyn_into().ok()?;
        canvas.set_id("fireworksCanvas");
        let style = canvas.style();
        for (key, value) in [
            ("position", "absolute"),
            ("top", "0"),
            ("left", "0"),
            ("width", "100%"),
            ("height", "100%"),
            ("pointer-events", "none"),
            ("z-index", "1002"),
        ] {
            let _ = style.set_property(key, value);
        }
        container.append_child(&canvas).ok()?;
        canvas.set_width(canvas.client_width().max(1) as u32);
        canvas.set_height(canvas.client_height().max(1) as u32);

        let painter = CanvasPainter::new(canvas.clone())?;
        let (w, h) = painter.size();
        let seed = js_sys::Date::now() as u64;
        let mut director =
            FireworksDirector::new(w, h, FireworksTuning::for_profile(profile), seed);

        // The overlay owns `stop`; the director's own flag covers a detached canvas
        let overlay_stop = stop.clone();
        let director_stop = director.stop_flag();
        run_frame_loop(director_stop, move |_time| {
            if overlay_stop.is_stopped() {
                director.teardown();
                return Schedule::Stop;
            }
            let schedule = director.tick(painter.is_attached());
            if schedule == Schedule::Continue {
                painter.clear();
                painter.paint(&shapes::fireworks(&director));
            }
            schedule
        });

        Some(canvas)
    }

    fn handle_events(game: &Rc<RefCell<Game>>, events: Vec<GameEvent>) {
        for event in events {
            match event {
                GameEvent::ScoreChanged { score, target } => {
                    game.borrow().sfx.play(SoundEffect::Overtake);
                    set_text("scoreDisplay", &ui::score_text(score, target));
                }
                GameEvent::Victory { score, target } => {
                    {
                        let mut g = game.borrow_mut();
                        g.sfx.play(SoundEffect::Victory);
                        g.mixer.victory();
                    }
                    show_victory(game, score, target);
                }
                GameEvent::GameOver { .. } => {
                    let screen = {
                        let mut g = game.borrow_mut();
                        g.sfx.play(SoundEffect::Crash);
                        g.mixer.game_over();
                        ui::screen_for(&g.state)
                    };
                    if let Some(screen) = screen {
                        show_screen(game, &screen);
                    }
                }
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Lane Racer starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(canvas) = element("gameCanvas").and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::warn!("#gameCanvas missing; nothing to draw on");
            return;
        };
        let Some(painter) = CanvasPainter::new(canvas.clone()) else {
            log::warn!("Canvas 2D context unavailable");
            return;
        };

        let settings = Settings::load();
        let user_agent = window.navigator().user_agent().unwrap_or_default();
        let profile = settings.resolve_profile(&user_agent);
        let tuning = element("tuning")
            .and_then(|el| el.text_content())
            .filter(|json| !json.trim().is_empty())
            .map(|json| Tuning::from_json_or_profile(&json, profile))
            .unwrap_or_else(|| Tuning::for_profile(profile));

        let arena = element("gameContainer")
            .map(|c| Arena::fit(c.client_width() as f32, c.client_height() as f32))
            .unwrap_or_default();
        painter.resize(&arena);

        let seed = js_sys::Date::now() as u64;
        let mixer = MusicMixer::new(settings.volume, settings.muted);

        let game = Rc::new(RefCell::new(Game {
            state: GameState::new(tuning, arena, seed),
            painter,
            mixer,
            music: MusicPlayer::new(),
            sfx: AudioManager::new(settings.volume, settings.muted),
            settings,
            profile,
            last_time: None,
            paused: false,
            demo: false,
            held_left: false,
            held_right: false,
            celebration: None,
        }));
        log::info!("Game initialized with seed {} ({})", seed, profile.as_str());

        {
            let g = game.borrow();
            set_text("scoreDisplay", &ui::score_text(0, g.state.target_score));
            set_text("muteButton", ui::mute_icon(g.settings.muted));
            if let Some(slider) =
                element("volumeSlider").and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            {
                slider.set_value(&format!("{}", (g.settings.volume * 100.0).round()));
            }
        }

        let title = ui::screen_for(&game.borrow().state);
        if let Some(screen) = title {
            show_screen(&game, &screen);
        }
        setup_theme_on_first_gesture(game.clone());
        setup_input_handlers(&canvas, game.clone());
        setup_audio_controls(game.clone());
        setup_window_handlers(game.clone());

        let frame_game = game.clone();
        run_frame_loop(StopFlag::new(), move |time| {
            let events = frame_game.borrow_mut().frame(time);
            handle_events(&frame_game, events);
            Schedule::Continue
        });

        log::info!("Lane Racer running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" => {
                        event.prevent_default();
                        g.held_left = true;
                        g.apply_keys();
                    }
                    "ArrowRight" => {
                        event.prevent_default();
                        g.held_right = true;
                        g.apply_keys();
                    }
                    "i" | "I" => {
                        g.demo = !g.demo;
                        if !g.demo {
                            g.state.set_horizontal_intent(false, false);
                        }
                        log::info!("Demo mode: {}", g.demo);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" => g.held_left = false,
                    "ArrowRight" => g.held_right = false,
                    _ => return,
                }
                g.apply_keys();
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                game.borrow_mut().steer_to_client_x(event.client_x() as f64);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start / move steer to the first finger
        for kind in ["touchstart", "touchmove"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    game.borrow_mut().steer_to_client_x(touch.client_x() as f64);
                }
            });
            let _ = canvas.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end releases any held direction
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                g.held_left = false;
                g.held_right = false;
                g.state.set_horizontal_intent(false, false);
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_audio_controls(game: Rc<RefCell<Game>>) {
        if let Some(button) = element("muteButton") {
            let game = game.clone();
            let button_clone = button.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let muted = game.borrow_mut().toggle_mute();
                button_clone.set_text_content(Some(ui::mute_icon(muted)));
            });
            let _ =
                button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(slider) =
            element("volumeSlider").and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            let slider_clone = slider.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                match slider_clone.value().parse::<f32>() {
                    Ok(percent) => game.borrow_mut().set_volume_percent(percent),
                    Err(e) => log::warn!("Bad volume slider value: {e}"),
                }
            });
            let _ =
                slider.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Browsers refuse audio before the first user gesture, so the title
    /// theme waits for one. Capture phase runs ahead of the start button.
    fn setup_theme_on_first_gesture(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else {
            return;
        };
        let started = Rc::new(Cell::new(false));
        for kind in ["click", "keydown"] {
            let game = game.clone();
            let started = started.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if started.replace(true) {
                    return;
                }
                let mut g = game.borrow_mut();
                g.sfx.resume();
                if !g.state.is_running() {
                    g.mixer.play_theme();
                }
            });
            let _ = document.add_event_listener_with_callback_and_bool(
                kind,
                closure.as_ref().unchecked_ref(),
                true,
            );
            closure.forget();
        }
    }

    fn setup_window_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Blur freezes the race, focus resumes it
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.state.is_running() && !g.paused {
                    log::info!("Paused (window blur)");
                }
                g.paused = true;
                g.last_time = None;
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.paused = false;
                g.last_time = None;
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().resize();
            });
            let _ =
                window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(el) = element("loading") {
            let _ = el.class_list().add_1("hidden");
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Lane Racer (native) starting headless autopilot race...");

    let tuning = native::load_tuning()?;
    let seed = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u64>())
        .transpose()
        .context("seed must be an integer")?
        .unwrap_or(2024);

    native::run_headless(tuning, seed);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use anyhow::Context;

    use lane_racer::consts::FRAME_MS;
    use lane_racer::fireworks::{FireworksDirector, FireworksTuning};
    use lane_racer::platform::Schedule;
    use lane_racer::sim::{Arena, GameEvent, GamePhase, GameState, autopilot};
    use lane_racer::{DeviceProfile, Tuning};

    /// Ten simulated minutes
    const MAX_FRAMES: u64 = 60 * 60 * 10;
    /// Five seconds of fireworks at 60 Hz
    const FIREWORKS_TICKS: u32 = 300;

    /// Default balance, or a JSON override named by `LANE_RACER_TUNING`
    pub fn load_tuning() -> anyhow::Result<Tuning> {
        let Ok(path) = std::env::var("LANE_RACER_TUNING") else {
            return Ok(Tuning::for_profile(DeviceProfile::Desktop));
        };
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("reading tuning override {path}"))?;
        let tuning =
            Tuning::from_json(&json).with_context(|| format!("invalid tuning override {path}"))?;
        log::info!("Loaded tuning override from {path}");
        Ok(tuning)
    }

    pub fn run_headless(tuning: Tuning, seed: u64) {
        let mut state = GameState::new(tuning, Arena::default(), seed);
        state.start();

        while state.is_running() && state.frame < MAX_FRAMES {
            state.input = autopilot::steer(&state);
            state.advance(FRAME_MS);
            for event in state.drain_events() {
                if let GameEvent::ScoreChanged { score, target } = event {
                    log::debug!("Overtake {score}/{target}");
                }
            }
        }

        let seconds = state.elapsed_ms / 1000.0;
        match state.phase {
            GamePhase::Victory => {
                log::info!(
                    "Victory after {:.1}s: {}/{} at {} km/h",
                    seconds,
                    state.score,
                    state.target_score,
                    state.speed_kmh()
                );
                run_fireworks(seed);
            }
            GamePhase::GameOver => log::info!(
                "Crashed after {:.1}s with {}/{}",
                seconds,
                state.score,
                state.target_score
            ),
            phase => log::info!("Stopped in {:?} after {:.1}s", phase, seconds),
        }
    }

    fn run_fireworks(seed: u64) {
        let arena = Arena::default();
        let mut director = FireworksDirector::new(
            arena.width,
            arena.height,
            FireworksTuning::for_profile(DeviceProfile::Desktop),
            seed,
        );
        let mut peak = 0;
        for _ in 0..FIREWORKS_TICKS {
            if director.tick(true) == Schedule::Stop {
                break;
            }
            peak = peak.max(director.particle_count());
        }
        log::info!(
            "Fireworks: {} launched, peak {} live particles",
            director.launched,
            peak
        );
        director.teardown();
    }
}
