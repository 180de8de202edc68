use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const DEFAULT_MAX_DEPTH: usize = 6;

// Directories that never contain a compose file worth ranking. Pruned
// before descent, regardless of how much depth remains.
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".hg",
    ".svn",
    "target",
    "dist",
    "build",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
    ".next",
    ".nuxt",
    ".cache",
    "coverage",
];

/// Result of one traversal. Warnings are unreadable subtrees that were
/// skipped; they never fail the scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub candidates: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

fn compose_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(docker-compose|compose)(\.[A-Za-z0-9_-]+)?\.ya?ml$")
            .expect("compose name pattern")
    })
}

/// True for `docker-compose.yml`, `compose.yaml`, `docker-compose.dev.yml`
/// and friends.
pub fn is_candidate_name(name: &str) -> bool {
    compose_name_pattern().is_match(name)
}

/// Depth of a candidate file relative to the scan root: 0 for a file that
/// sits directly in the root.
pub fn candidate_depth(path: &Path, root: &Path) -> usize {
    path.strip_prefix(root)
        .map(|rel| rel.components().count().saturating_sub(1))
        .unwrap_or(0)
}

/// Walk `root` up to `max_depth` and collect compose file candidates.
/// Excluded directories are pruned outright; unreadable subtrees are
/// reported as warnings and skipped. Output is path-sorted so downstream
/// ranking sees a stable order no matter how the walk interleaved.
pub fn scan(root: &Path, max_depth: usize, extra_excludes: &[String]) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        // files at candidate depth N sit at walkdir depth N+1
        .max_depth(max_depth + 1)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_str().unwrap_or("");
            !(EXCLUDED_DIRS.contains(&name) || extra_excludes.iter().any(|x| x == name))
        });

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let name = entry.file_name().to_str().unwrap_or("");
                if is_candidate_name(name) {
                    outcome.candidates.push(entry.path().to_path_buf());
                }
            }
            Ok(_) => {}
            Err(err) => {
                let loc = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                warn!("skipping unreadable entry {loc}: {err}");
                outcome.warnings.push(format!("{loc}: {err}"));
            }
        }
    }

    outcome.candidates.sort();
    debug!(
        "scan of {} found {} candidate(s), {} warning(s)",
        root.display(),
        outcome.candidates.len(),
        outcome.warnings.len()
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "services: {}\n").unwrap();
    }

    #[test]
    fn candidate_names() {
        assert!(is_candidate_name("docker-compose.yml"));
        assert!(is_candidate_name("docker-compose.yaml"));
        assert!(is_candidate_name("compose.yml"));
        assert!(is_candidate_name("compose.yaml"));
        assert!(is_candidate_name("docker-compose.dev.yml"));
        assert!(is_candidate_name("compose.prod.yaml"));
        assert!(is_candidate_name("Docker-Compose.YML"));

        assert!(!is_candidate_name("docker-compose.json"));
        assert!(!is_candidate_name("my-docker-compose.yml"));
        assert!(!is_candidate_name("composer.yml"));
        assert!(!is_candidate_name("docker-compose.dev.local.yml"));
        assert!(!is_candidate_name("Dockerfile"));
    }

    #[test]
    fn finds_candidates_and_sorts_by_path() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("docker-compose.yml"));
        touch(&root.join("zeta/docker-compose.yml"));
        touch(&root.join("alpha/compose.yaml"));
        touch(&root.join("alpha/README.yml")); // not a candidate

        let outcome = scan(root, DEFAULT_MAX_DEPTH, &[]);
        assert_eq!(
            outcome.candidates,
            vec![
                root.join("alpha/compose.yaml"),
                root.join("docker-compose.yml"),
                root.join("zeta/docker-compose.yml"),
            ]
        );
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn respects_depth_limit() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("a/b/docker-compose.yml")); // depth 2
        touch(&root.join("a/b/c/docker-compose.yml")); // depth 3

        let outcome = scan(root, 2, &[]);
        assert_eq!(outcome.candidates, vec![root.join("a/b/docker-compose.yml")]);

        for candidate in &scan(root, DEFAULT_MAX_DEPTH, &[]).candidates {
            assert!(candidate_depth(candidate, root) <= DEFAULT_MAX_DEPTH);
        }
    }

    #[test]
    fn depth_zero_is_root_file() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("docker-compose.yml"));
        touch(&root.join("sub/docker-compose.yml"));

        assert_eq!(candidate_depth(&root.join("docker-compose.yml"), root), 0);
        assert_eq!(candidate_depth(&root.join("sub/docker-compose.yml"), root), 1);
    }

    #[test]
    fn never_descends_into_excluded_dirs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("node_modules/pkg/docker-compose.yml"));
        touch(&root.join(".git/docker-compose.yml"));
        touch(&root.join("dist/docker-compose.yml"));
        touch(&root.join("src/docker-compose.yml"));

        let outcome = scan(root, DEFAULT_MAX_DEPTH, &[]);
        assert_eq!(outcome.candidates, vec![root.join("src/docker-compose.yml")]);
    }

    #[test]
    fn caller_supplied_excludes_are_pruned() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("legacy/docker-compose.yml"));
        touch(&root.join("docker-compose.yml"));

        let outcome = scan(root, DEFAULT_MAX_DEPTH, &["legacy".to_string()]);
        assert_eq!(outcome.candidates, vec![root.join("docker-compose.yml")]);
    }

    #[test]
    fn empty_tree_yields_empty_result() {
        let tmp = TempDir::new().unwrap();
        let outcome = scan(tmp.path(), DEFAULT_MAX_DEPTH, &[]);
        assert!(outcome.candidates.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn root_dir_named_like_an_excluded_dir_is_still_scanned() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("build");
        touch(&root.join("docker-compose.yml"));

        let outcome = scan(&root, DEFAULT_MAX_DEPTH, &[]);
        assert_eq!(outcome.candidates.len(), 1);
    }
}
