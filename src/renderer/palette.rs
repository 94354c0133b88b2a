//! Colours: RGBA arrays in `[0, 1]`, HSL conversion and car liveries

use crate::sim::Team;

pub type Color = [f32; 4];

/// Opaque colour from a `0xRRGGBB` literal
pub const fn hex(rgb: u32) -> Color {
    [
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// HSL to RGBA. `hue` in degrees (wrapped), saturation and lightness in `[0, 1]`.
pub fn hsl(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Color {
    let h = hue.rem_euclid(360.0) / 60.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m, alpha.clamp(0.0, 1.0)]
}

/// CSS `rgba()` string for a canvas fill style
pub fn css(color: Color) -> String {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({}, {}, {}, {})",
        channel(color[0]),
        channel(color[1]),
        channel(color[2]),
        color[3].clamp(0.0, 1.0)
    )
}

/// Paint scheme for one car
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Livery {
    /// Body
    pub main: Color,
    /// Sidepods
    pub second: Color,
    /// Wings
    pub accent: Color,
    pub cockpit: Color,
}

/// The player's red-and-white car
pub const PLAYER_LIVERY: Livery = Livery {
    main: hex(0xFF1801),
    second: hex(0x940000),
    accent: hex(0xFFFFFF),
    cockpit: colors::CARBON,
};

pub fn livery(team: Team) -> Livery {
    let (main, second, accent) = match team {
        Team::Mercedes => (0x00D2BE, 0x00B0B2, 0x000000),
        Team::Ferrari => (0xDC0000, 0x950000, 0xFFFFFF),
        Team::RedBull => (0x0600EF, 0x1E41FF, 0xFFD700),
        Team::Alpine => (0x2293D1, 0x0F65A1, 0xFF1E1E),
        Team::AstonMartin => (0x006F62, 0x004C42, 0xFFFFFF),
    };
    Livery {
        main: hex(main),
        second: hex(second),
        accent: hex(accent),
        cockpit: colors::BLACK,
    }
}

/// Colors for game elements
pub mod colors {
    use super::{Color, hex};

    pub const ROAD: Color = hex(0x333333);
    pub const LANE_MARKING: Color = hex(0xFFFFFF);
    pub const HUD_TEXT: Color = hex(0xFFFFFF);
    pub const CARBON: Color = hex(0x1A1A1A);
    pub const BLACK: Color = hex(0x000000);
    pub const HELMET: Color = hex(0xFFD700);
    /// Translucent black laid over the fireworks canvas each tick
    pub const FIREWORKS_FADE: Color = [0.0, 0.0, 0.0, 0.2];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color, b: Color) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-3)
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(0xFF0000), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(hex(0x000000), [0.0, 0.0, 0.0, 1.0]);
        assert!(close(hex(0x333333), [0.2, 0.2, 0.2, 1.0]));
    }

    #[test]
    fn test_hsl_primaries() {
        assert!(close(hsl(0.0, 1.0, 0.5, 1.0), [1.0, 0.0, 0.0, 1.0]));
        assert!(close(hsl(120.0, 1.0, 0.5, 1.0), [0.0, 1.0, 0.0, 1.0]));
        assert!(close(hsl(240.0, 1.0, 0.5, 0.5), [0.0, 0.0, 1.0, 0.5]));
        assert!(close(hsl(60.0, 1.0, 0.5, 1.0), [1.0, 1.0, 0.0, 1.0]));
        // Wraps
        assert!(close(hsl(360.0, 1.0, 0.5, 1.0), hsl(0.0, 1.0, 0.5, 1.0)));
        assert!(close(hsl(-120.0, 1.0, 0.5, 1.0), hsl(240.0, 1.0, 0.5, 1.0)));
        // No saturation is grey
        assert!(close(hsl(200.0, 0.0, 0.5, 1.0), [0.5, 0.5, 0.5, 1.0]));
    }

    #[test]
    fn test_css() {
        assert_eq!(css(hex(0xFF1801)), "rgba(255, 24, 1, 1)");
        assert_eq!(css(colors::FIREWORKS_FADE), "rgba(0, 0, 0, 0.2)");
        assert_eq!(css([2.0, -1.0, 0.5, 3.0]), "rgba(255, 0, 128, 1)");
    }

    #[test]
    fn test_every_team_has_distinct_body() {
        let bodies: Vec<Color> = Team::ALL.iter().map(|&t| livery(t).main).collect();
        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
