use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::BrightYellow;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const SUCCESS: Color = Color::Green;
pub const CHANGED: Color = Color::Yellow;
pub const FAILURE: Color = Color::Red;

pub const DIFF_ADD: Color = Color::Green;
pub const DIFF_REMOVE: Color = Color::Red;
pub const DIFF_CONTEXT: Color = Color::Cyan;
