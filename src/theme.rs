use ratatui::style::{Color, Modifier, Style};

#[derive(Clone, Debug)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub selected: Color,
    pub muted: Color,
}

impl Theme {
    pub fn synthwave_dark() -> Self {
        Self {
            bg: Color::Rgb(24, 24, 26),
            fg: Color::White,
            accent: Color::Rgb(64, 160, 255),
            selected: Color::Rgb(255, 120, 0),
            muted: Color::DarkGray,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::synthwave_dark()
    }
}

// Style helpers that use the theme
impl Theme {
    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.selected)
    }

    pub fn text_active_bold(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text_editing_bold(&self) -> Style {
        Style::default()
            .fg(self.selected)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text_muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn button_style(&self, focused: bool) -> Style {
        if focused {
            Style::default()
                .fg(self.bg)
                .bg(self.selected)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.fg)
        }
    }
}

// Helpers bound to the default theme
pub fn border_focused() -> Style {
    Theme::default().border_focused()
}

pub fn text_active_bold() -> Style {
    Theme::default().text_active_bold()
}

pub fn text_editing_bold() -> Style {
    Theme::default().text_editing_bold()
}

pub fn text_muted() -> Style {
    Theme::default().text_muted()
}

pub fn button_style(focused: bool) -> Style {
    Theme::default().button_style(focused)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focused_styles_stand_out() {
        assert_ne!(button_style(true), button_style(false));
        assert_ne!(text_editing_bold(), text_active_bold());
        assert_eq!(border_focused().fg, Some(Theme::default().selected));
    }
}
