use once_cell::sync::Lazy;
use regex::Regex;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[<>:"/\\|?*\x00-\x1F\x7F\x{80}-\x{9F}]"#).expect("valid unsafe-char pattern")
});

static SEPARATOR_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[_ .]+").expect("valid separator pattern"));

/// Make `name` safe to use as a file name stem.
///
/// Filesystem-unsafe and control characters (C0, DEL, C1) become `_`, runs of
/// underscores, spaces and dots collapse into a single `_`, and leading/trailing `_`
/// are trimmed. Case is preserved.
pub fn sanitize_filename(name: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(name, "_");
    let collapsed = SEPARATOR_RUNS.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_string()
}
