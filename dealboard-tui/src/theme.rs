//! SynthBrute theme and color utilities.

use dealboard_core::{Priority, Stage};
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct SynthBruteTheme {
    pub bg: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub tertiary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub text_muted: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl SynthBruteTheme {
    pub fn synthbrute() -> Self {
        Self {
            bg: Color::Rgb(10, 10, 10),
            bg_highlight: Color::Rgb(42, 42, 42),
            primary: Color::Rgb(0, 255, 255),
            primary_dim: Color::Rgb(0, 136, 136),
            secondary: Color::Rgb(255, 0, 255),
            tertiary: Color::Rgb(255, 255, 0),
            success: Color::Rgb(0, 255, 0),
            warning: Color::Rgb(255, 170, 0),
            error: Color::Rgb(255, 0, 0),
            info: Color::Rgb(0, 255, 255),
            text: Color::Rgb(255, 255, 255),
            text_dim: Color::Rgb(136, 136, 136),
            text_muted: Color::Rgb(68, 68, 68),
            border: Color::Rgb(68, 68, 68),
            border_focus: Color::Rgb(0, 255, 255),
        }
    }
}

pub fn stage_color(stage: Stage, theme: &SynthBruteTheme) -> Color {
    match stage {
        Stage::New => theme.info,
        Stage::Contacted => theme.primary_dim,
        Stage::Proposal => theme.secondary,
        Stage::Negotiation => theme.tertiary,
        Stage::Won => theme.success,
        Stage::Lost => theme.error,
    }
}

pub fn priority_color(priority: Priority, theme: &SynthBruteTheme) -> Color {
    match priority {
        Priority::Low => theme.text_dim,
        Priority::Medium => theme.text,
        Priority::High => theme.warning,
    }
}
