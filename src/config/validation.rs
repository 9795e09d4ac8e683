use regex::Regex;
use std::sync::OnceLock;

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"))
}

/// Expands `${VAR_NAME}` references through `lookup`. Unknown variables are
/// left as written.
pub fn expand_with<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_var_pattern()
        .replace_all(value, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub fn validate_server_url(url: &str) -> Result<(), String> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(parsed) => Err(format!(
            "Unsupported URL scheme '{}' in server URL: {}",
            parsed.scheme(),
            url
        )),
        Err(e) => Err(format!("Invalid server URL '{}': {}", url, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_with_known_and_unknown_vars() {
        let expanded = expand_with("Bearer ${TOKEN} ${MISSING}", |name| {
            (name == "TOKEN").then(|| "s3cret".to_string())
        });
        assert_eq!(expanded, "Bearer s3cret ${MISSING}");
    }

    #[test]
    fn test_validate_server_url() {
        assert!(validate_server_url("http://localhost:8000").is_ok());
        assert!(validate_server_url("https://tools.example.com/base").is_ok());
        assert!(validate_server_url("ftp://example.com").is_err());
        assert!(validate_server_url("not a url").is_err());
    }
}
