/// Content type used when the key's extension is unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Guess the `Content-Type` for an object key from its extension.
pub fn guess_content_type(key: &str) -> &'static str {
    mime_guess::from_path(key)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
