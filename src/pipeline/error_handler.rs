use crate::error::{FetchStage, ItemFailure, ServiceError};
use crate::types::SearchResultItem;
use crate::utils::logger::Logger;

/// Log an isolated thumbnail failure. `index` is the item's 0-based position in the page and
/// is reported 1-based.
pub fn report_item_failure(
    logger: &dyn Logger,
    index: usize,
    item: &SearchResultItem,
    failure: &ItemFailure,
) {
    logger.warn(
        &format!(
            "{} failed for item #{} \"{}\" [{}]",
            capitalize(&failure.stage.to_string()),
            index + 1,
            item.title,
            item.thumbnail_url
        ),
        Some(&failure.error),
    );
}

/// Log a failed detail branch (full image or analysis).
pub fn report_detail_failure(logger: &dyn Logger, item: &SearchResultItem, failure: &ItemFailure) {
    let what = match failure.stage {
        FetchStage::Analysis => "Image analysis",
        _ => "Full image download",
    };
    logger.warn(
        &format!("{} failed [{}]", what, item.media_url),
        Some(&failure.error),
    );
}

/// Log a run-ending search failure.
pub fn report_run_failure(logger: &dyn Logger, query: &str, error: &ServiceError) {
    logger.error(
        &format!("Image search failed for \"{}\"", query),
        Some(error),
    );
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
