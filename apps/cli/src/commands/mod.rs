//! Command implementations for the Tuneflow CLI.

pub mod annotate;
pub mod dataset;
pub mod pipeline;
pub mod train;

/// Dataset file used when `--file` is not given.
pub const DEFAULT_DATASET_FILE: &str = "preference_dataset.json";

/// Shortens multi-line text to a single line of at most `max` characters.
pub fn preview(text: &str, max: usize) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= max {
        return line;
    }
    let cut: String = line.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("line one\nline   two", 40), "line one line two");
        assert_eq!(preview("abcdefghij", 5), "abcd…");
    }
}
