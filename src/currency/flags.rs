//! Flag references derived from a currency code.
//!
//! Both the image URL and the terminal emoji are pure functions of the code,
//! so the UI recomputes them on every draw instead of caching them.

use super::flag_code;

/// Default flag image host
pub const DEFAULT_FLAG_BASE_URL: &str = "https://www.flagsapi.com";

/// Flag image URL for a currency code, `None` when the code has no flag entry
pub fn flag_url(base_url: &str, currency_code: &str) -> Option<String> {
    let country = flag_code(currency_code)?;
    Some(format!(
        "{}/{}/shiny/64.png",
        base_url.trim_end_matches('/'),
        country
    ))
}

/// Regional-indicator emoji for a two-letter country code ("US" -> 🇺🇸)
pub fn flag_emoji(country_code: &str) -> Option<String> {
    if country_code.len() != 2 || !country_code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    country_code
        .chars()
        .map(|c| {
            let offset = c.to_ascii_uppercase() as u32 - 'A' as u32;
            char::from_u32(0x1F1E6 + offset)
        })
        .collect()
}
