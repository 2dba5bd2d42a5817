use std::env;

/// Env vars probed for an API key, in priority order: the app-prefixed
/// variant first, then the conventions the Gemini tooling itself uses.
pub const KEY_ENV_VARS: &[&str] = &["WISHBOARD_API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Resolves a usable credential, or `None` when the board runs offline.
/// Never errors; any lookup failure counts as absent.
pub fn resolve() -> Option<String> {
    resolve_with(|name| env::var(name).ok())
}

pub fn resolve_with<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    KEY_ENV_VARS
        .iter()
        .find_map(|name| lookup(name).and_then(usable))
}

fn usable(raw: String) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value == "undefined" {
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{resolve_with, KEY_ENV_VARS};

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn absent_empty_and_literal_undefined_are_rejected() {
        let empty = env_of(&[]);
        assert_eq!(resolve_with(|name| empty.get(name).cloned()), None);

        let blank = env_of(&[("GEMINI_API_KEY", "   ")]);
        assert_eq!(resolve_with(|name| blank.get(name).cloned()), None);

        let undefined = env_of(&[("GEMINI_API_KEY", "undefined")]);
        assert_eq!(resolve_with(|name| undefined.get(name).cloned()), None);
    }

    #[test]
    fn first_usable_value_wins_in_probe_order() {
        let env = env_of(&[
            ("WISHBOARD_API_KEY", "undefined"),
            ("GEMINI_API_KEY", " gm-key "),
            ("GOOGLE_API_KEY", "gg-key"),
        ]);
        assert_eq!(
            resolve_with(|name| env.get(name).cloned()),
            Some("gm-key".to_string())
        );

        let env = env_of(&[("WISHBOARD_API_KEY", "wb-key"), ("GEMINI_API_KEY", "gm-key")]);
        assert_eq!(
            resolve_with(|name| env.get(name).cloned()),
            Some("wb-key".to_string())
        );
    }

    #[test]
    fn probe_order_is_fixed() {
        assert_eq!(
            KEY_ENV_VARS,
            &["WISHBOARD_API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"]
        );
    }
}
