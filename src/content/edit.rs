//! Edit detection

use super::PostDetail;
use crate::helpers::DateFormatter;
use crate::i18n::I18n;

/// A post is edited when its last publication differs from the first.
/// Without a last publication date it never counts as edited.
pub fn is_edited(post: &PostDetail) -> bool {
    match post.last_publication_date {
        Some(last) => post.first_publication_date != Some(last),
        None => false,
    }
}

/// The "* editado em ..." indicator, or `None` for unedited posts
pub fn edition_label(post: &PostDetail, dates: &DateFormatter, i18n: &I18n) -> Option<String> {
    if !is_edited(post) {
        return None;
    }
    let last = post.last_publication_date?;
    Some(i18n.format(
        "post.edited",
        &[("date", &dates.date(&last)), ("time", &dates.time(&last))],
    ))
}
