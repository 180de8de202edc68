use serde::Serialize;
use std::path::Path;

/// Environment tag inferred from a compose file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

// Ordered token table; first exact match wins.
const ENV_TOKENS: &[(&str, Environment)] = &[
    ("development", Environment::Development),
    ("dev", Environment::Development),
    ("production", Environment::Production),
    ("prod", Environment::Production),
    ("staging", Environment::Staging),
    ("stage", Environment::Staging),
    ("testing", Environment::Test),
    ("test", Environment::Test),
];

/// Classify a candidate file: which environment variant its name declares
/// (if any), and whether it sits directly at the scan root.
///
/// Pure function over the two paths; does no filesystem access.
pub fn classify(path: &Path, root: &Path) -> (Option<Environment>, bool) {
    let environment = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(environment_from_name);
    let is_root = path.parent() == Some(root);
    (environment, is_root)
}

/// Extract the environment token from names like `docker-compose.dev.yml`.
/// The token is the dot-separated segment between base name and extension;
/// a name without one (the main file) yields `None`.
pub fn environment_from_name(name: &str) -> Option<Environment> {
    let lower = name.to_lowercase();
    let stem = lower
        .strip_suffix(".yml")
        .or_else(|| lower.strip_suffix(".yaml"))?;
    let rest = stem
        .strip_prefix("docker-compose")
        .or_else(|| stem.strip_prefix("compose"))?;
    let token = rest.strip_prefix('.')?;
    ENV_TOKENS
        .iter()
        .find(|(spelling, _)| *spelling == token)
        .map(|(_, env)| *env)
}
