//! Device identity
//!
//! Artifacts from different machines share one directory, so media filenames
//! are namespaced by a stable, filesystem-safe identifier derived from the
//! local hostname. Computed once at startup and read-only thereafter.

/// Compute the device identity from the local hostname.
///
/// Every byte that is not ASCII alphanumeric is replaced with `-` so the
/// result is always safe to embed in a filename.
pub fn device_identity() -> String {
    let raw = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize(&raw)
}

fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    if cleaned.is_empty() {
        "unknown-device".to_string()
    } else {
        cleaned
    }
}
