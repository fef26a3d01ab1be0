// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::config::Config;

/// Public API used when no distinct backend is configured. Implements the
/// same /latest and /symbols wire contract as any configured backend.
pub const PUBLIC_API_BASE: &str = "https://api.exchangerate.host";

fn strip_trailing_slash(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn nonempty(url: &Option<String>) -> Option<String> {
    url.as_deref()
        .map(strip_trailing_slash)
        .filter(|u| !u.is_empty())
}

/// Compute the effective data-source base URL.
///
/// Preference order: primary, secondary, origin. A configured primary always
/// wins, even when it happens to match the origin. Resolution that bottoms
/// out at the caller's own origin (or at nothing) means no real backend was
/// configured, so the public fallback is substituted. Never fails.
pub fn resolve(config: &Config) -> String {
    if let Some(primary) = nonempty(&config.primary_api_url) {
        return primary;
    }

    let origin = nonempty(&config.origin).unwrap_or_default();

    if let Some(secondary) = nonempty(&config.secondary_api_url) {
        if secondary != origin {
            return secondary;
        }
        // Secondary pointing back at ourselves is not a distinct backend.
        return PUBLIC_API_BASE.to_string();
    }

    if origin.is_empty() {
        return PUBLIC_API_BASE.to_string();
    }

    // Only the origin is left; that means "no real backend configured".
    PUBLIC_API_BASE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(
        primary: Option<&str>,
        secondary: Option<&str>,
        origin: Option<&str>,
    ) -> Config {
        Config {
            primary_api_url: primary.map(String::from),
            secondary_api_url: secondary.map(String::from),
            origin: origin.map(String::from),
            cache_db_url: "sqlite::memory:".to_string(),
            default_base: "USD".to_string(),
        }
    }

    #[test]
    fn test_primary_wins() {
        let cfg = config(
            Some("https://rates.example.com/"),
            Some("https://backup.example.com"),
            Some("https://calc.example.com"),
        );
        assert_eq!(resolve(&cfg), "https://rates.example.com");
    }

    #[test]
    fn test_primary_wins_even_when_equal_to_origin() {
        let cfg = config(
            Some("https://calc.example.com"),
            None,
            Some("https://calc.example.com/"),
        );
        assert_eq!(resolve(&cfg), "https://calc.example.com");
    }

    #[test]
    fn test_secondary_used_when_no_primary() {
        let cfg = config(None, Some("https://backup.example.com/"), None);
        assert_eq!(resolve(&cfg), "https://backup.example.com");
    }

    #[test]
    fn test_secondary_matching_origin_falls_back() {
        let cfg = config(
            None,
            Some("https://calc.example.com"),
            Some("https://calc.example.com/"),
        );
        assert_eq!(resolve(&cfg), PUBLIC_API_BASE);
    }

    #[test]
    fn test_origin_only_falls_back_to_public_api() {
        let cfg = config(None, None, Some("https://calc.example.com"));
        assert_eq!(resolve(&cfg), PUBLIC_API_BASE);
    }

    #[test]
    fn test_nothing_configured_falls_back() {
        let cfg = config(None, None, None);
        assert_eq!(resolve(&cfg), PUBLIC_API_BASE);
    }

    #[test]
    fn test_blank_urls_are_ignored() {
        let cfg = config(Some("   "), Some(""), None);
        assert_eq!(resolve(&cfg), PUBLIC_API_BASE);
    }
}
