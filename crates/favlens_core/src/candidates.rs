use crate::CandidateJob;

/// Suffixes that mark a URL as already pointing at an image.
pub const IMAGE_SUFFIXES: &[&str] = &[".ico", ".png", ".jpg", ".jpeg", ".gif", ".svg"];

const FAVICON_PATH: &str = "favicon.ico";

/// Splits input text into candidate jobs: one per non-blank line, trimmed,
/// with the favicon path appended where needed. Ids start at 1 and follow
/// line order.
pub fn parse_candidates(raw: &str) -> Vec<CandidateJob> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .zip(1..)
        .map(|(line, id)| CandidateJob {
            id,
            url: with_favicon_path(line),
        })
        .collect()
}

/// Appends `/favicon.ico` to a URL that names neither an image file nor a
/// favicon. A trailing slash is not doubled.
pub fn with_favicon_path(url: &str) -> String {
    let has_image_suffix = IMAGE_SUFFIXES.iter().any(|suffix| url.ends_with(suffix));
    if has_image_suffix || url.contains("favicon") {
        return url.to_string();
    }
    if url.ends_with('/') {
        format!("{url}{FAVICON_PATH}")
    } else {
        format!("{url}/{FAVICON_PATH}")
    }
}
