use colored::*;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};
use terminal_size::{terminal_size, Width};

const MAX_RULE_WIDTH: usize = 60;

/// Renders titled, syntax-highlighted blocks for terminal output.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    color: bool,
}

impl Highlighter {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            color: colored::control::SHOULD_COLORIZE.should_colorize(),
        }
    }

    pub fn plain() -> Self {
        Self {
            color: false,
            ..Self::new()
        }
    }

    pub fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        if !self.color {
            return code.to_string();
        }

        let theme = &self.theme_set.themes["Solarized (dark)"];
        let syntax = lang
            .and_then(|lang| {
                self.syntax_set
                    .find_syntax_by_token(lang)
                    .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            })
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut output = String::new();

        for line in LinesWithEndings::from(code) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => {
                    let ranges: Vec<(Style, &str)> = ranges;
                    output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
                }
                Err(_) => output.push_str(line),
            }
        }

        if output.ends_with('\n') {
            // Reset so the trailing colour does not bleed into the footer
            output.push_str("\x1b[0m");
        }
        output
    }

    /// A block framed by a `┌─[title]` header and a closing rule.
    pub fn render_block(&self, title: &str, lang: Option<&str>, content: &str) -> String {
        let width = rule_width();
        let header_rule = "─".repeat(width.saturating_sub(title.chars().count() + 4));

        let mut body = self.highlight_code(content, lang);
        if !body.ends_with('\n') {
            body.push('\n');
        }

        format!(
            "{}[{}]{}\n{}{}\n",
            "┌─".dimmed(),
            title.cyan(),
            header_rule.dimmed(),
            body,
            format!("└{}", "─".repeat(width.saturating_sub(1))).dimmed()
        )
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

fn rule_width() -> usize {
    match terminal_size() {
        Some((Width(w), _)) => (w as usize).clamp(20, MAX_RULE_WIDTH),
        None => MAX_RULE_WIDTH,
    }
}
