#[macro_export]
macro_rules! print_result_err {
    ($context:expr, $result:expr $(,)?) => {{
        if let Err(err) = $result {
            log::error!("[{}:{}] Error {}: {:?}", ::std::file!(), ::std::line!(), $context, err);
        }
    }};
}

#[macro_export]
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

/// Take the first half of a spacing string, used where the layout wants a narrower gap.
pub fn half_spacing(spacing: &str) -> &str {
    let half = spacing.chars().count() / 2;
    match spacing.char_indices().nth(half) {
        Some((idx, _)) => &spacing[..idx],
        None => spacing,
    }
}
