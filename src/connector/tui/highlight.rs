use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

const THEME_NAME: &str = "base16-eighties.dark";

struct HighlightAssets {
    syntax_set: SyntaxSet,
    theme: Theme,
}

/// Syntax definitions and theme, loaded on first use.
fn assets() -> &'static HighlightAssets {
    static ASSETS: OnceLock<HighlightAssets> = OnceLock::new();
    ASSETS.get_or_init(|| {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .remove(THEME_NAME)
            .or_else(|| theme_set.themes.into_values().next())
            .unwrap_or_default();
        HighlightAssets { syntax_set, theme }
    })
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    if language.is_empty() {
        return None;
    }
    let assets = assets();
    assets
        .syntax_set
        .find_syntax_by_token(language)
        .or_else(|| assets.syntax_set.find_syntax_by_extension(language))
}

/// Style used when highlighting itself fails.
fn fallback_code_style() -> Style {
    Style::default().fg(Color::Gray)
}

fn to_ratatui_style(style: syntect::highlighting::Style) -> Style {
    let fg = style.foreground;
    let mut out = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}

/// Highlight a code block line by line.
///
/// Unknown or absent language tags use the plain-text syntax, which renders
/// everything in the theme's default foreground.
pub fn highlight_code(code: &str, language: &str) -> Vec<Line<'static>> {
    let assets = assets();
    let syntax = find_syntax(language).unwrap_or_else(|| assets.syntax_set.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, &assets.theme);

    LinesWithEndings::from(code)
        .map(|line| match highlighter.highlight_line(line, &assets.syntax_set) {
            Ok(ranges) => {
                let spans: Vec<Span<'static>> = ranges
                    .into_iter()
                    .map(|(style, text)| {
                        Span::styled(
                            text.trim_end_matches(['\n', '\r']).to_string(),
                            to_ratatui_style(style),
                        )
                    })
                    .filter(|span| !span.content.is_empty())
                    .collect();
                Line::from(spans)
            }
            Err(_) => Line::styled(
                line.trim_end_matches(['\n', '\r']).to_string(),
                fallback_code_style(),
            ),
        })
        .collect()
}
