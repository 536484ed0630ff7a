//! Color palette and shared styles.
//!
//! Charcoal base with a single red accent; result kinds get their own hue so
//! the card grid reads at a glance.

use ratatui::style::{Color, Modifier, Style};

pub mod colors {
    use ratatui::style::Color;

    // Surfaces, darkest first.
    pub const CANVAS: Color = Color::Rgb(18, 18, 20); // #121214
    pub const CARD: Color = Color::Rgb(33, 33, 36); // #212124
    pub const CARD_SELECTED: Color = Color::Rgb(52, 50, 56); // #343238
    pub const OUTLINE: Color = Color::Rgb(72, 72, 78); // #48484e
    pub const OUTLINE_FOCUS: Color = Color::Rgb(230, 84, 84); // #e65454

    // Text.
    pub const INK: Color = Color::Rgb(236, 236, 238); // #ececee
    pub const INK_SOFT: Color = Color::Rgb(186, 186, 192); // #babac0
    /// Channel names, URLs, hints
    pub const INK_FAINT: Color = Color::Rgb(118, 118, 126); // #76767e
    pub const INK_OFF: Color = Color::Rgb(74, 74, 80); // #4a4a50

    pub const RED: Color = Color::Rgb(255, 78, 69); // #ff4e45

    // Result kinds.
    pub const KIND_VIDEO: Color = Color::Rgb(255, 120, 110); // #ff786e
    pub const KIND_CHANNEL: Color = Color::Rgb(120, 200, 150); // #78c896
    pub const KIND_PLAYLIST: Color = Color::Rgb(240, 190, 100); // #f0be64

    pub const SIGNED_IN: Color = Color::Rgb(120, 200, 150); // #78c896
    pub const SIGNED_OUT: Color = Color::Rgb(240, 190, 100); // #f0be64
}

/// Resolved colors for one theme. Copy it freely; every style helper takes
/// it by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemePalette {
    pub accent: Color,
    pub bg: Color,
    pub fg: Color,
    pub fg_soft: Color,
    pub card: Color,
    pub card_selected: Color,
    pub faint: Color,
    pub off: Color,
    pub outline: Color,
    pub outline_focus: Color,
}

impl ThemePalette {
    pub fn dark() -> Self {
        use colors::*;
        Self {
            accent: RED,
            bg: CANVAS,
            fg: INK,
            fg_soft: INK_SOFT,
            card: CARD,
            card_selected: CARD_SELECTED,
            faint: INK_FAINT,
            off: INK_OFF,
            outline: OUTLINE,
            outline_focus: OUTLINE_FOCUS,
        }
    }

    fn bold(color: Color) -> Style {
        Style::new().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn title(self) -> Style {
        Self::bold(self.accent)
    }

    pub fn text(self) -> Style {
        Style::new().fg(self.fg)
    }

    pub fn body(self) -> Style {
        Style::new().fg(self.fg_soft)
    }

    pub fn hint_style(self) -> Style {
        Style::new().fg(self.faint)
    }

    pub fn border_style(self) -> Style {
        Style::new().fg(self.outline)
    }

    pub fn border_focus_style(self) -> Style {
        Style::new().fg(self.outline_focus)
    }

    pub fn surface_style(self) -> Style {
        Style::new().bg(self.card)
    }

    pub fn selected_style(self) -> Style {
        Style::new()
            .bg(self.card_selected)
            .add_modifier(Modifier::BOLD)
    }

    /// Enabled pager button.
    pub fn button_style(self) -> Style {
        Self::bold(self.fg).bg(self.card)
    }

    /// Pager button with no cursor behind it.
    pub fn disabled_style(self) -> Style {
        Style::new().fg(self.off).add_modifier(Modifier::DIM)
    }

    /// Label color for "video", "channel" or "playlist".
    pub fn kind_style(self, kind: &str) -> Style {
        match kind {
            "video" => Self::bold(colors::KIND_VIDEO),
            "channel" => Self::bold(colors::KIND_CHANNEL),
            "playlist" => Self::bold(colors::KIND_PLAYLIST),
            _ => self.hint_style(),
        }
    }
}

/// Footer legend
pub fn kbd_style(palette: ThemePalette) -> Style {
    Style::new().fg(palette.fg_soft)
}

/// Sign-in indicator in the header.
pub fn session_style(signed_in: bool) -> Style {
    ThemePalette::bold(if signed_in {
        colors::SIGNED_IN
    } else {
        colors::SIGNED_OUT
    })
}
