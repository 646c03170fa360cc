//! Line-oriented change-log rendering.

use snaplog_core::sequencer::ChangeEvent;
use std::io::{self, Write};

pub const NO_DIFFERENCES: &str = "No differences between duplicate snapshots.";

/// `entity_key | field | old  -->  new | changed: <timestamp or ->`
pub fn render_line(event: &ChangeEvent) -> String {
    format!(
        "{} | {} | {}  -->  {} | changed: {}",
        event.entity_key,
        event.field_path,
        event.old_value,
        event.new_value,
        event.change_timestamp.as_deref().unwrap_or("-")
    )
}

/// Write one line per event, or [`NO_DIFFERENCES`] when there are none.
///
/// # Errors
///
/// Propagates write failures.
pub fn render_all<'a, W, I>(mut out: W, events: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a ChangeEvent>,
{
    let mut count = 0;
    for event in events {
        writeln!(out, "{}", render_line(event))?;
        count += 1;
    }
    if count == 0 {
        writeln!(out, "{}", NO_DIFFERENCES)?;
    }
    Ok(count)
}
