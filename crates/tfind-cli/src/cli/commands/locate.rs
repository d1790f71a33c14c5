//! `tfind locate`: which item holds the Nth match.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tfind_engine::extract::event_title;
use tfind_engine::transcript::load;
use tfind_engine::{DataLevelResolver, Span, TermMatcher};

/// Bytes of context kept on each side of the match.
const CONTEXT: usize = 40;

pub fn run(file: &Path, term: &str, index: usize) -> Result<()> {
    let resolver = DataLevelResolver::new(load::load_file(file)?);
    let total = resolver.count_all(term);
    if total == 0 {
        bail!("No matches for '{term}'");
    }
    let Some(location) = resolver.resolve(term, index) else {
        bail!("Match {index} is out of range: '{term}' has {total} matches");
    };
    let entry = resolver
        .transcript()
        .get(location.item_index)
        .context("matched item is missing")?;
    let item = entry.item();

    println!("match {index}/{total}");
    println!(
        "item {} ({}): {}",
        location.item_index,
        item.id.as_str(),
        event_title(&item.payload)
    );
    println!("occurrence {}", location.occurrence);

    let found = TermMatcher::new(term)
        .and_then(|matcher| matcher.locate_segments(entry.text(), location.occurrence));
    if let Some(found) = found
        && let Some(segment) = entry.text().get(found.segment)
    {
        println!("{}", excerpt(segment, found.span));
    }
    Ok(())
}

/// The line holding `span`, cut to some context, with the match bracketed.
fn excerpt(text: &str, span: Span) -> String {
    let line_start = text[..span.start].rfind('\n').map_or(0, |at| at + 1);
    let line_end = text[span.end..]
        .find('\n')
        .map_or(text.len(), |at| span.end + at);

    let mut from = line_start.max(span.start.saturating_sub(CONTEXT));
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = line_end.min(span.end + CONTEXT);
    while !text.is_char_boundary(to) {
        to += 1;
    }

    let lead = if from > line_start { "…" } else { "" };
    let tail = if to < line_end { "…" } else { "" };
    format!(
        "{lead}{}[{}]{}{tail}",
        &text[from..span.start],
        &text[span.start..span.end],
        &text[span.end..to]
    )
}
