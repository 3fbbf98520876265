use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub panel: Color,
    pub text: Color,
    pub dim: Color,
    pub accent: Color,
    pub positive: Color,
    pub warning: Color,
    pub error: Color,
    pub selected: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(8, 12, 16),
            panel: Color::Rgb(20, 26, 32),
            text: Color::Rgb(220, 220, 220),
            dim: Color::Rgb(140, 140, 140),
            accent: Color::Rgb(80, 160, 160),
            positive: Color::Rgb(90, 170, 100),
            warning: Color::Rgb(210, 170, 60),
            error: Color::Rgb(200, 80, 80),
            selected: Color::Rgb(40, 52, 64),
        }
    }
}
