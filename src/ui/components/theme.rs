//! Color palette for the dashboard host and the search overlay.
//!
//! Design principles:
//! - Muted surfaces so the overlay reads as a layer above the page
//! - One accent per result category, used for group headers and markers
//! - High contrast for the selected row

use ratatui::style::{Color, Modifier, Style};

use crate::model::types::Category;

pub mod colors {
    use ratatui::style::Color;

    // ═══════════════════════════════════════════════════════════════════════════
    // BASE COLORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Page background
    pub const BG_DEEP: Color = Color::Rgb(26, 27, 38); // #1a1b26

    /// Overlay surface
    pub const BG_SURFACE: Color = Color::Rgb(36, 40, 59); // #24283b

    /// Selected row
    pub const BG_HIGHLIGHT: Color = Color::Rgb(52, 59, 88); // #343b58

    pub const BORDER: Color = Color::Rgb(59, 66, 97); // #3b4261

    pub const BORDER_FOCUS: Color = Color::Rgb(125, 145, 200); // #7d91c8

    // ═══════════════════════════════════════════════════════════════════════════
    // TEXT COLORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub const TEXT_PRIMARY: Color = Color::Rgb(192, 202, 245); // #c0caf5

    pub const TEXT_SECONDARY: Color = Color::Rgb(169, 177, 214); // #a9b1d6

    /// Hints and placeholders, WCAG AA-large on BG_SURFACE
    pub const TEXT_MUTED: Color = Color::Rgb(105, 114, 158); // #69729e

    // ═══════════════════════════════════════════════════════════════════════════
    // CATEGORY ACCENTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Portfolios - primary blue
    pub const CATEGORY_PORTFOLIO: Color = Color::Rgb(122, 162, 247); // #7aa2f7

    /// Assets - sage green
    pub const CATEGORY_ASSET: Color = Color::Rgb(158, 206, 106); // #9ece6a

    /// Documents - amber
    pub const CATEGORY_DOCUMENT: Color = Color::Rgb(224, 175, 104); // #e0af68

    /// Articles - violet
    pub const CATEGORY_ARTICLE: Color = Color::Rgb(187, 154, 247); // #bb9af7

    // ═══════════════════════════════════════════════════════════════════════════
    // STATUS COLORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub const STATUS_INFO: Color = Color::Rgb(125, 207, 255); // #7dcfff
}

/// Accent color for a result category.
pub fn category_accent(category: Category) -> Color {
    match category {
        Category::Portfolio => colors::CATEGORY_PORTFOLIO,
        Category::Asset => colors::CATEGORY_ASSET,
        Category::Document => colors::CATEGORY_DOCUMENT,
        Category::Article => colors::CATEGORY_ARTICLE,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemePalette {
    pub accent: Color,
    pub bg: Color,
    pub fg: Color,
    pub fg_dim: Color,
    pub surface: Color,
    pub selected: Color,
    pub hint: Color,
    pub border: Color,
    pub status: Color,
}

impl ThemePalette {
    pub fn dark() -> Self {
        Self {
            accent: colors::CATEGORY_PORTFOLIO,
            bg: colors::BG_DEEP,
            fg: colors::TEXT_PRIMARY,
            fg_dim: colors::TEXT_SECONDARY,
            surface: colors::BG_SURFACE,
            selected: colors::BG_HIGHLIGHT,
            hint: colors::TEXT_MUTED,
            border: colors::BORDER,
            status: colors::STATUS_INFO,
        }
    }

    pub fn light() -> Self {
        Self {
            accent: Color::Rgb(47, 107, 231),
            bg: Color::Rgb(250, 250, 252),
            fg: Color::Rgb(36, 41, 46),
            fg_dim: Color::Rgb(88, 96, 105),
            surface: Color::Rgb(240, 241, 245),
            selected: Color::Rgb(214, 226, 250),
            hint: Color::Rgb(125, 134, 144),
            border: Color::Rgb(216, 222, 228),
            status: Color::Rgb(3, 102, 214),
        }
    }

    pub fn title(self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn hint_style(self) -> Style {
        Style::default().fg(self.hint)
    }

    pub fn border_style(self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn border_focus_style(self) -> Style {
        Style::default().fg(colors::BORDER_FOCUS)
    }

    pub fn surface_style(self) -> Style {
        Style::default().bg(self.surface).fg(self.fg)
    }

    /// Selected palette row.
    pub fn highlight_style(self) -> Style {
        Style::default()
            .bg(self.selected)
            .fg(self.fg)
            .add_modifier(Modifier::BOLD)
    }

    /// Group header, tinted with the category accent.
    pub fn group_header(self, category: Category) -> Style {
        Style::default()
            .fg(category_accent(category))
            .bg(self.surface)
            .add_modifier(Modifier::BOLD)
    }
}
