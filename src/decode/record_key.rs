/// Id carried by `key`: the segment two positions after the first segment
/// equal to `marker`, e.g. `abc` in `cfg/runtime-configurations/chains/abc`.
///
/// `None` when the marker is missing or the target segment is absent or empty.
pub fn extract_record_id(
    key: &str,
    marker: &str,
) -> Option<String> {
    let marker = marker.trim_start_matches('/');
    let segments: Vec<&str> = key.split('/').collect();
    let position = segments.iter().position(|s| *s == marker)?;

    segments
        .get(position + 2)
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
}

/// Whether `key` sits exactly one non-empty segment below `prefix`.
///
/// Leading slashes are ignored on both sides, since listings return keys
/// without one.
pub fn filter_direct_children(
    prefix: &str,
    key: &str,
) -> bool {
    let prefix = prefix.trim_start_matches('/').trim_end_matches('/');
    let Some(rest) = key.trim_start_matches('/').strip_prefix(prefix) else {
        return false;
    };
    match rest.strip_prefix('/') {
        Some(child) => !child.is_empty() && !child.contains('/'),
        None => false,
    }
}
