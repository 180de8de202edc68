use std::path::Path;

/// Load `.env` from the scan root into the process env, best-effort.
/// Compose files routinely reference `${VAR}` in ports and images, so this
/// runs once before any candidate is parsed.
pub fn load_env(root: &Path) -> Option<String> {
    let base = root.join(".env");
    if base.exists() {
        dotenvy::from_path(&base).ok();
        return Some(".env".to_string());
    }
    None
}

/// Expand `${NAME}` and `${NAME:-default}` occurrences in a compose value
/// string. Unset variables resolve to their default, or to the empty string.
pub fn interpolate(input: &str) -> String {
    if !input.contains("${") {
        return input.to_string();
    }

    let mut out = String::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' && i + 1 < chars.len() && chars[i + 1] == '{' {
            // find closing }
            let mut j = i + 2;
            while j < chars.len() && chars[j] != '}' {
                j += 1;
            }
            if j >= chars.len() {
                out.push(chars[i]);
                i += 1;
                continue;
            }
            let inner: String = chars[i + 2..j].iter().collect();
            let (name, def) = if let Some(pos) = inner.find(":-") {
                (inner[..pos].to_string(), Some(inner[pos + 2..].to_string()))
            } else {
                (inner, None)
            };

            match std::env::var(&name) {
                Ok(v) if !v.is_empty() => out.push_str(&v),
                _ => {
                    if let Some(d) = def {
                        out.push_str(&d);
                    }
                }
            }

            i = j + 1;
            continue;
        }

        out.push(chars[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolate_passthrough_without_refs() {
        assert_eq!(interpolate("8080:80"), "8080:80");
    }

    #[test]
    fn interpolate_uses_default_when_unset() {
        std::env::remove_var("SCOUT_TEST_UNSET");
        assert_eq!(interpolate("${SCOUT_TEST_UNSET:-9090}:80"), "9090:80");
    }

    #[test]
    fn interpolate_prefers_env_value() {
        std::env::set_var("SCOUT_TEST_PORT", "3000");
        assert_eq!(interpolate("${SCOUT_TEST_PORT:-9090}:80"), "3000:80");
        std::env::remove_var("SCOUT_TEST_PORT");
    }

    #[test]
    fn interpolate_unset_without_default_is_empty() {
        std::env::remove_var("SCOUT_TEST_GONE");
        assert_eq!(interpolate("${SCOUT_TEST_GONE}"), "");
    }

    #[test]
    fn interpolate_keeps_unterminated_ref() {
        assert_eq!(interpolate("${BROKEN"), "${BROKEN");
    }
}
