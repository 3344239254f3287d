//! Content module - post models, reading time and edit detection

mod edit;
mod post;
mod reading;

pub use edit::{edition_label, is_edited};
pub use post::{ContentSection, PostDetail, PostSummary};
pub use reading::{reading_time, reading_time_with, total_words, DEFAULT_WORDS_PER_MINUTE};
