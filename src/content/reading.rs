//! Reading time estimation

use super::ContentSection;

/// Average reading speed used when none is configured
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Whitespace-separated tokens across every heading and every block
pub fn total_words(content: &[ContentSection]) -> usize {
    content
        .iter()
        .map(|section| {
            let heading = section.heading.split_whitespace().count();
            let body: usize = section
                .body
                .iter()
                .map(|block| block.text.split_whitespace().count())
                .sum();
            heading + body
        })
        .sum()
}

/// Reading time in minutes at the default speed
pub fn reading_time(content: &[ContentSection]) -> usize {
    reading_time_with(content, DEFAULT_WORDS_PER_MINUTE)
}

/// Reading time in minutes, rounded up. Empty content reads in 0 minutes.
pub fn reading_time_with(content: &[ContentSection], words_per_minute: usize) -> usize {
    let words_per_minute = if words_per_minute == 0 {
        DEFAULT_WORDS_PER_MINUTE
    } else {
        words_per_minute
    };
    total_words(content).div_ceil(words_per_minute)
}
