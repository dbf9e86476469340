/// Root page slug.
pub(crate) const ROOT_SLUG: &str = "/";

/// Page slug from a title: `/` + lower-cased title, whitespace runs hyphenated,
/// `?` and `#` dropped.
pub(crate) fn slugify(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .filter(|c| *c != '?' && *c != '#')
        .collect::<String>()
        .to_lowercase();

    let hyphenated = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    format!("/{hyphenated}")
}

/// `base` if unused, otherwise `base-N` with N one past the highest suffix in use.
pub(crate) fn unique_slug<'a>(base: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let base = base.trim();

    let mut has_base = false;
    let mut max_suffix: u32 = 1;

    for slug in existing {
        let s = slug.trim();
        if s == base {
            has_base = true;
            continue;
        }

        // base-2, base-3, ...
        if let Some(rest) = s.strip_prefix(&format!("{base}-")) {
            if let Ok(k) = rest.parse::<u32>() {
                if k >= max_suffix {
                    max_suffix = k;
                }
            }
        }
    }

    if !has_base {
        return base.to_string();
    }

    format!("{}-{}", base, max_suffix.saturating_add(1))
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
