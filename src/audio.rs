//! Music and sound effects
//!
//! Background music is three looping tracks that hand over to each other
//! with sequential fades. `MusicMixer` decides *when* and *how loud*; it is
//! plain state driven by the frame clock and emits `MixCommand`s. On wasm,
//! `MusicPlayer` applies those commands to `<audio>` elements, and
//! `AudioManager` adds procedurally generated cues via the Web Audio API.

use std::collections::VecDeque;

/// Length of every fade in and fade out
pub const FADE_MS: f32 = 2000.0;
/// Pause between the race track ending and the victory track starting
pub const VICTORY_SILENCE_MS: f32 = 500.0;
/// Master volume when nothing has been saved yet
pub const DEFAULT_VOLUME: f32 = 0.7;

/// Background music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicTrack {
    /// Menu / between races
    Theme,
    /// While racing
    Race,
    /// Victory screen
    Victory,
}

impl MusicTrack {
    pub const ALL: [MusicTrack; 3] = [MusicTrack::Theme, MusicTrack::Race, MusicTrack::Victory];

    /// Per-track mix level relative to the master volume
    pub fn base_gain(self) -> f32 {
        match self {
            MusicTrack::Theme => 0.65,
            MusicTrack::Race => 0.75,
            MusicTrack::Victory => 0.8,
        }
    }

    pub fn src(self) -> &'static str {
        match self {
            MusicTrack::Theme => "sounds/f1-theme.mp3",
            MusicTrack::Race => "sounds/promise-me.mp3",
            MusicTrack::Victory => "sounds/legends-made.mp3",
        }
    }

    fn index(self) -> usize {
        match self {
            MusicTrack::Theme => 0,
            MusicTrack::Race => 1,
            MusicTrack::Victory => 2,
        }
    }
}

/// What the audio back end should do right now
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MixCommand {
    /// Start (or resume) playback
    Play(MusicTrack),
    /// Set the element volume, already scaled by master volume and mute
    Volume(MusicTrack, f32),
    /// Pause and rewind to the beginning
    Stop(MusicTrack),
}

/// One queued transition step
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    FadeOut(MusicTrack),
    FadeIn(MusicTrack),
    Silence(f32),
    StopNow(MusicTrack),
}

#[derive(Debug, Clone, Copy)]
struct ActiveStep {
    step: Step,
    elapsed: f32,
    duration: f32,
    /// Fade level the step started from
    from: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Channel {
    playing: bool,
    /// Fade position, 0.0 silent to 1.0 full
    level: f32,
}

/// Crossfade scheduler for the background music
#[derive(Debug, Clone)]
pub struct MusicMixer {
    channels: [Channel; 3],
    queue: VecDeque<Step>,
    active: Option<ActiveStep>,
    volume: f32,
    muted: bool,
}

impl Default for MusicMixer {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME, false)
    }
}

impl MusicMixer {
    pub fn new(volume: f32, muted: bool) -> Self {
        Self {
            channels: [Channel::default(); 3],
            queue: VecDeque::new(),
            active: None,
            volume: volume.clamp(0.0, 1.0),
            muted,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_playing(&self, track: MusicTrack) -> bool {
        self.channels[track.index()].playing
    }

    pub fn level(&self, track: MusicTrack) -> f32 {
        self.channels[track.index()].level
    }

    /// No transition pending or in progress
    pub fn is_settled(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    /// Volume the element for `track` should have right now
    pub fn output_volume(&self, track: MusicTrack) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume * track.base_gain() * self.level(track)
        }
    }

    /// Title screen music
    pub fn play_theme(&mut self) {
        self.transition(&[Step::FadeIn(MusicTrack::Theme)]);
    }

    /// Theme out, race track in
    pub fn start_race(&mut self) {
        self.transition(&[
            Step::StopNow(MusicTrack::Victory),
            Step::FadeOut(MusicTrack::Theme),
            Step::FadeIn(MusicTrack::Race),
        ]);
    }

    /// Race track out, short silence, victory track in
    pub fn victory(&mut self) {
        self.transition(&[
            Step::FadeOut(MusicTrack::Race),
            Step::Silence(VICTORY_SILENCE_MS),
            Step::FadeIn(MusicTrack::Victory),
        ]);
    }

    /// Race track out, theme back in
    pub fn game_over(&mut self) {
        self.transition(&[Step::FadeOut(MusicTrack::Race), Step::FadeIn(MusicTrack::Theme)]);
    }

    /// Replaces whatever transition was pending. A fade cut short keeps the
    /// level it had reached.
    fn transition(&mut self, steps: &[Step]) {
        self.active = None;
        self.queue.clear();
        self.queue.extend(steps.iter().copied());
    }

    /// The back end could not play `track` (autoplay blocked, missing file).
    /// The channel goes silent and a fade on it ends at once.
    pub fn mark_stopped(&mut self, track: MusicTrack) {
        let channel = &mut self.channels[track.index()];
        if channel.playing {
            log::debug!("{:?} marked stopped by the player", track);
        }
        channel.playing = false;
        channel.level = 0.0;
        if let Some(active) = self.active.as_mut() {
            if matches!(active.step, Step::FadeOut(t) | Step::FadeIn(t) if t == track) {
                active.duration = active.elapsed;
            }
        }
    }

    pub fn set_volume(&mut self, volume: f32) -> Vec<MixCommand> {
        self.volume = volume.clamp(0.0, 1.0);
        self.volume_commands()
    }

    pub fn set_muted(&mut self, muted: bool) -> Vec<MixCommand> {
        self.muted = muted;
        self.volume_commands()
    }

    fn volume_commands(&self) -> Vec<MixCommand> {
        MusicTrack::ALL
            .iter()
            .filter(|&&t| self.is_playing(t))
            .map(|&t| MixCommand::Volume(t, self.output_volume(t)))
            .collect()
    }

    /// Advance queued transitions by `dt_ms`. Leftover time from a finished
    /// step carries into the next one.
    pub fn update(&mut self, dt_ms: f32) -> Vec<MixCommand> {
        let mut out = Vec::new();
        let mut budget = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };

        loop {
            let mut active = match self.active.take() {
                Some(active) => active,
                None => match self.queue.pop_front() {
                    Some(step) => self.begin(step, &mut out),
                    None => break,
                },
            };

            let used = budget.min(active.duration - active.elapsed);
            active.elapsed += used;
            budget -= used;
            self.progress(&active, &mut out);

            if active.elapsed >= active.duration {
                self.finish(active.step, &mut out);
            } else {
                self.active = Some(active);
                break;
            }
        }
        out
    }

    fn begin(&mut self, step: Step, out: &mut Vec<MixCommand>) -> ActiveStep {
        let mut active = ActiveStep {
            step,
            elapsed: 0.0,
            duration: 0.0,
            from: 0.0,
        };
        match step {
            Step::FadeOut(track) => {
                // Nothing to fade if it isn't playing
                if self.is_playing(track) {
                    active.from = self.level(track);
                    active.duration = FADE_MS * active.from;
                }
            }
            Step::FadeIn(track) => {
                let channel = &mut self.channels[track.index()];
                active.from = if channel.playing { channel.level } else { 0.0 };
                channel.level = active.from;
                channel.playing = true;
                active.duration = FADE_MS * (1.0 - active.from);
                out.push(MixCommand::Volume(track, self.output_volume(track)));
                out.push(MixCommand::Play(track));
            }
            Step::Silence(ms) => active.duration = ms,
            Step::StopNow(_) => {}
        }
        active
    }

    fn progress(&mut self, active: &ActiveStep, out: &mut Vec<MixCommand>) {
        let t = if active.duration > 0.0 {
            active.elapsed / active.duration
        } else {
            1.0
        };
        let (track, level) = match active.step {
            Step::FadeOut(track) if self.is_playing(track) => (track, active.from * (1.0 - t)),
            Step::FadeIn(track) if self.is_playing(track) => {
                (track, active.from + (1.0 - active.from) * t)
            }
            _ => return,
        };
        self.channels[track.index()].level = level;
        out.push(MixCommand::Volume(track, self.output_volume(track)));
    }

    fn finish(&mut self, step: Step, out: &mut Vec<MixCommand>) {
        match step {
            Step::FadeOut(track) | Step::StopNow(track) => {
                let channel = &mut self.channels[track.index()];
                if channel.playing {
                    channel.playing = false;
                    channel.level = 0.0;
                    out.push(MixCommand::Stop(track));
                }
            }
            Step::FadeIn(track) => {
                let channel = &mut self.channels[track.index()];
                if channel.playing {
                    channel.level = 1.0;
                }
            }
            Step::Silence(_) => {}
        }
    }
}

/// Short procedural cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Hit a rival
    Crash,
    /// A rival left the bottom of the screen
    Overtake,
    /// Target reached
    Victory,
}

#[cfg(target_arch = "wasm32")]
pub use web::{AudioManager, MusicPlayer};

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{AudioContext, GainNode, HtmlAudioElement, OscillatorNode, OscillatorType};

    use super::{MixCommand, MusicTrack, SoundEffect};

    /// `<audio>` elements for the three music tracks
    pub struct MusicPlayer {
        elements: Vec<(MusicTrack, HtmlAudioElement)>,
        /// Tracks whose play() was refused, filled from promise callbacks
        failed: Rc<RefCell<Vec<MusicTrack>>>,
    }

    impl MusicPlayer {
        pub fn new() -> Self {
            let elements = MusicTrack::ALL
                .iter()
                .filter_map(|&track| match HtmlAudioElement::new_with_src(track.src()) {
                    Ok(el) => {
                        el.set_loop(true);
                        el.set_volume(0.0);
                        el.set_preload("auto");
                        Some((track, el))
                    }
                    Err(e) => {
                        log::warn!("Could not create audio for {:?}: {:?}", track, e);
                        None
                    }
                })
                .collect();
            Self {
                elements,
                failed: Rc::new(RefCell::new(Vec::new())),
            }
        }

        /// Tracks the browser refused to play since the last call
        pub fn take_failed(&self) -> Vec<MusicTrack> {
            std::mem::take(&mut *self.failed.borrow_mut())
        }

        fn element(&self, track: MusicTrack) -> Option<&HtmlAudioElement> {
            self.elements.iter().find(|(t, _)| *t == track).map(|(_, el)| el)
        }

        pub fn apply(&self, commands: &[MixCommand]) {
            for command in commands {
                match *command {
                    MixCommand::Play(track) => {
                        let Some(el) = self.element(track) else { continue };
                        match el.play() {
                            Ok(promise) => {
                                // Autoplay blocks reject the promise
                                let failed = self.failed.clone();
                                let on_error = Closure::once(move |e: JsValue| {
                                    log::warn!("Audio play failed for {:?}: {:?}", track, e);
                                    failed.borrow_mut().push(track);
                                });
                                let _ = promise.catch(&on_error);
                                on_error.forget();
                            }
                            Err(e) => {
                                log::warn!("Audio play failed for {:?}: {:?}", track, e);
                                self.failed.borrow_mut().push(track);
                            }
                        }
                    }
                    MixCommand::Volume(track, volume) => {
                        if let Some(el) = self.element(track) {
                            el.set_volume(volume.clamp(0.0, 1.0) as f64);
                        }
                    }
                    MixCommand::Stop(track) => {
                        if let Some(el) = self.element(track) {
                            let _ = el.pause();
                            el.set_current_time(0.0);
                        }
                    }
                }
            }
        }
    }

    impl Default for MusicPlayer {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Sound effects through the Web Audio API
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        volume: f32,
        muted: bool,
    }

    impl AudioManager {
        pub fn new(volume: f32, muted: bool) -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - sound effects disabled");
            }
            Self {
                ctx,
                volume: volume.clamp(0.0, 1.0),
                muted,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn effective_volume(&self) -> f32 {
            if self.muted { 0.0 } else { self.volume }
        }

        pub fn play(&self, effect: SoundEffect) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Crash => self.play_crash(ctx, vol),
                SoundEffect::Overtake => self.play_overtake(ctx, vol),
                SoundEffect::Victory => self.play_victory(ctx, vol),
            }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Crash - low crunch with a metallic rattle
        fn play_crash(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 110.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.5, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.5)
                    .ok();
                osc.frequency().set_value_at_time(110.0, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(30.0, t + 0.5)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.6).ok();
            }

            if let Some((osc, gain)) = self.create_osc(ctx, 900.0, OscillatorType::Square) {
                gain.gain().set_value_at_time(vol * 0.15, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.2)
                    .ok();
                osc.frequency().set_value_at_time(900.0, t).ok();
                osc.frequency().set_value_at_time(400.0, t + 0.03).ok();
                osc.frequency().set_value_at_time(1200.0, t + 0.06).ok();
                osc.frequency().set_value_at_time(300.0, t + 0.1).ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.25).ok();
            }
        }

        /// Overtake - quick rising blip
        fn play_overtake(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 500.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.15, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                .ok();
            osc.frequency().set_value_at_time(500.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(900.0, t + 0.1)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }

        /// Victory - rising fanfare
        fn play_victory(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [523.0, 659.0, 784.0, 1047.0].iter().enumerate() {
                let delay = i as f64 * 0.12;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.3, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.45)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.5).ok();
                }
            }
        }
    }
}
