//! Styled text for rendered items.
//!
//! Items render into [`StyledLine`]s tagged with semantic [`Style`]s. The
//! terminal colors are chosen in one place, [`to_ratatui`], so the layout code
//! never touches ratatui types.

use ratatui::style::{Color, Modifier, Style as TermStyle};

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: Style,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// One terminal row of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    /// The row's plain text, exactly as it is drawn.
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

/// Semantic style identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    /// Depth indentation and header markers.
    Guide,
    /// Item title.
    Title,
    /// Title of a span that groups nested items.
    SpanTitle,
    User,
    Assistant,
    System,
    ToolTitle,
    /// Tool arguments, collapsed or expanded.
    ToolArgs,
    ToolOutput,
    /// "… N more lines" markers and cut-off ellipses.
    Truncation,
    /// Wording the view adds around data, such as `args:` or `(2 keys)`.
    Label,
    Error,
    /// Secondary detail: tracebacks, targets, explanations.
    Muted,
}

impl Style {
    /// Whether text in this style comes from the item's data. Only such text
    /// can hold a find match.
    pub fn is_searchable(self) -> bool {
        !matches!(self, Self::Guide | Self::Truncation | Self::Label)
    }
}

/// Converts a semantic style to a terminal style.
pub fn to_ratatui(style: Style) -> TermStyle {
    let base = TermStyle::default();
    match style {
        Style::Plain => base,
        Style::Guide => base.fg(Color::DarkGray),
        Style::Title => base.fg(Color::White).add_modifier(Modifier::BOLD),
        Style::SpanTitle => base
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        Style::User => base.fg(Color::Green).add_modifier(Modifier::ITALIC),
        Style::Assistant => base.fg(Color::White),
        Style::System => base.fg(Color::DarkGray),
        Style::ToolTitle => base.fg(Color::Yellow).add_modifier(Modifier::BOLD),
        Style::ToolArgs => base.fg(Color::Cyan),
        Style::ToolOutput => base.fg(Color::DarkGray),
        Style::Truncation => base.fg(Color::Yellow).add_modifier(Modifier::DIM),
        Style::Label => base.fg(Color::DarkGray),
        Style::Error => base.fg(Color::Red),
        Style::Muted => base
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM | Modifier::ITALIC),
    }
}
