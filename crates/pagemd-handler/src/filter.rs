//! Path filtering with glob patterns.
//!
//! Patterns are matched segment-wise against the request path: `*` matches
//! exactly one path segment, `**` matches any number of remaining segments
//! (including none). A pattern must consume the whole path to match.

/// Normalizes a request path for matching and cache keying: ensures a
/// leading `/` and strips a single trailing `/` (the root path stays `/`).
pub fn normalize_path(path: &str) -> String {
    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Returns true when the normalized path must not be rendered: it matches
/// an exclude pattern, or the include list is non-empty and no include
/// pattern matches.
pub fn is_excluded(path: &str, include: &[String], exclude: &[String]) -> bool {
    if exclude.iter().any(|pattern| glob_match(pattern, path)) {
        return true;
    }
    !include.is_empty() && !include.iter().any(|pattern| glob_match(pattern, path))
}

/// Matches a glob pattern against a path, segment by segment.
pub fn glob_match(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match_segments(&pattern_segments, &path_segments)
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        // `**` matches the remaining path unconditionally, even when no
        // segments are left.
        Some(&"**") => true,
        Some(&"*") => !path.is_empty() && match_segments(&pattern[1..], &path[1..]),
        Some(segment) => {
            path.first() == Some(segment) && match_segments(&pattern[1..], &path[1..])
        }
    }
}
