//! Error reports for the log channel.

use std::error::Error as StdError;

use botplus_common::{Colour, Embed, Prompt};

/// Longest description an embed is allowed to carry.
const MAX_DESCRIPTION: usize = 4096;

/// `error` followed by each of its sources, one per line.
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Red embed with the caller's details above the error chain.
pub fn error_prompt(error: &(dyn StdError + 'static), details: &[&str]) -> Prompt {
    let mut description = String::new();
    for line in details {
        description.push_str(line);
        description.push('\n');
    }
    description.push_str("```\n");
    description.push_str(&error_chain(error));
    description.push_str("\n```");

    Prompt::embed(
        Embed::new()
            .title("Error")
            .description(truncate(description, MAX_DESCRIPTION))
            .colour(Colour::RED),
    )
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut cut = max.saturating_sub('…'.len_utf8());
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push('…');
    }
    text
}
