//! HUD and overlay text
//!
//! Everything the DOM layer shows as text is built here so it can be tested
//! without a browser.

use crate::sim::{GamePhase, GameState};

/// Title and body copy for a full-screen overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenText {
    pub title: String,
    pub lines: Vec<String>,
    pub button: &'static str,
}

pub fn score_text(score: u32, target: u32) -> String {
    format!("{score}/{target}")
}

/// Speed readout drawn on the canvas (desktop only)
pub fn speed_text(kmh: u32) -> String {
    format!("Speed: {kmh} km/h")
}

/// Plain number for the `#speedDisplay` element
pub fn speed_value(kmh: u32) -> String {
    kmh.to_string()
}

pub fn title_screen() -> ScreenText {
    ScreenText {
        title: "Lane Racer".to_string(),
        lines: instructions(),
        button: "Start Race",
    }
}

pub fn instructions() -> Vec<String> {
    vec![
        "Use \u{2190} \u{2192} arrow keys or the mouse to steer".to_string(),
        "On touch screens, drag to steer".to_string(),
        "Overtake cars by letting them pass you".to_string(),
        "Press I to watch the autopilot drive".to_string(),
    ]
}

pub fn victory_screen(score: u32, target: u32) -> ScreenText {
    ScreenText {
        title: "\u{1F3C6} Champion \u{1F3C6}".to_string(),
        lines: vec![
            "Just like Senna, you've achieved greatness!".to_string(),
            format!("Score: {}", score_text(score, target)),
        ],
        button: "Race Again",
    }
}

pub fn game_over_screen(score: u32, target: u32) -> ScreenText {
    ScreenText {
        title: "Race Over".to_string(),
        lines: vec![
            format!("Score: {}", score_text(score, target)),
            "\"Sometimes you have to go through the darkness to get to the light.\" - Ayrton Senna"
                .to_string(),
        ],
        button: "Try Again",
    }
}

/// Overlay for the current phase, if one should be showing
pub fn screen_for(state: &GameState) -> Option<ScreenText> {
    match state.phase {
        GamePhase::Idle => Some(title_screen()),
        GamePhase::Running => None,
        GamePhase::Victory => Some(victory_screen(state.score, state.target_score)),
        GamePhase::GameOver => Some(game_over_screen(state.score, state.target_score)),
    }
}

/// Mute button label
pub fn mute_icon(muted: bool) -> &'static str {
    if muted { "\u{1F507}" } else { "\u{1F50A}" }
}
