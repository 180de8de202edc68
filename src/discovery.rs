use crate::compose::{self, ServiceSummary};
use crate::error::DiscoveryError;
use crate::rank;
use crate::scanner;
use crate::variant::{self, Environment};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task;
use tracing::{debug, info};

/// One ranked compose file candidate, assembled from traversal metadata,
/// the parsed summary and the variant classification. Built once per scan
/// and immutable afterwards; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub directory: PathBuf,
    pub depth: usize,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
    pub environment: Option<Environment>,
    pub is_root_candidate: bool,
    pub priority_score: i64,
    pub service_count: usize,
    /// Set when the file contributed zero services; the candidate still
    /// ranks, it just carries an empty summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    pub services: Vec<ServiceSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    pub max_depth: usize,
    pub excludes: Vec<String>,
    pub timeout: Option<Duration>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        DiscoverOptions {
            max_depth: scanner::DEFAULT_MAX_DEPTH,
            excludes: Vec::new(),
            timeout: None,
        }
    }
}

/// Scan `root`, parse and classify every candidate on a bounded worker
/// pool, and return the ranked list. The only hard failures are an
/// unreadable root, a timeout, and an empty result set.
pub async fn discover(
    root: &Path,
    opts: &DiscoverOptions,
) -> Result<Vec<DiscoveredFile>, DiscoveryError> {
    match opts.timeout {
        Some(limit) => tokio::time::timeout(limit, discover_inner(root, opts))
            .await
            .map_err(|_| DiscoveryError::Timeout {
                root: root.to_path_buf(),
                seconds: limit.as_secs(),
            })?,
        None => discover_inner(root, opts).await,
    }
}

async fn discover_inner(
    root: &Path,
    opts: &DiscoverOptions,
) -> Result<Vec<DiscoveredFile>, DiscoveryError> {
    let root = root.canonicalize()?;

    let outcome = {
        let root = root.clone();
        let max_depth = opts.max_depth;
        let excludes = opts.excludes.clone();
        task::spawn_blocking(move || scanner::scan(&root, max_depth, &excludes))
            .await
            .map_err(|e| DiscoveryError::Join(e.to_string()))?
    };

    if outcome.candidates.is_empty() {
        return Err(DiscoveryError::NoCandidates(root));
    }

    // Candidates are independent: parse them concurrently, unordered.
    // Ranking re-imposes a deterministic order afterwards.
    let workers = worker_count();
    let files: Vec<DiscoveredFile> = stream::iter(outcome.candidates.into_iter().map(|path| {
        let root = root.clone();
        async move {
            task::spawn_blocking(move || inspect(path, &root))
                .await
                .ok()
        }
    }))
    .buffer_unordered(workers)
    .filter_map(|file| async move { file })
    .collect()
    .await;

    let ranked = rank::rank(files);
    info!(
        "discovered {} compose file(s) under {}",
        ranked.len(),
        root.display()
    );
    Ok(ranked)
}

fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(8)
}

/// Build one candidate: filesystem metadata, variant classification and the
/// tolerant parse. Parse failures land in `parse_error`; they never bubble.
fn inspect(path: PathBuf, root: &Path) -> DiscoveredFile {
    let metadata = fs::metadata(&path).ok();
    let size_bytes = metadata.as_ref().map(|m| m.len()).unwrap_or(0);
    let modified_at = metadata
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from);

    let (environment, is_root_candidate) = variant::classify(&path, root);
    let depth = scanner::candidate_depth(&path, root);
    let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
    let directory = path.parent().unwrap_or(root).to_path_buf();

    let (services, skipped, parse_error) = match compose::parse_file(&path) {
        Ok(summary) => (summary.services, summary.skipped, None),
        Err(failure) => {
            debug!("{}: {failure}", path.display());
            (Vec::new(), Vec::new(), Some(failure.to_string()))
        }
    };

    DiscoveredFile {
        path,
        relative_path,
        directory,
        depth,
        size_bytes,
        modified_at,
        environment,
        is_root_candidate,
        priority_score: 0,
        service_count: services.len(),
        parse_error,
        services,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn single_root_file_with_two_services() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "docker-compose.yml",
            r#"
services:
  web:
    image: nginx
    ports:
      - "8080:80"
  db:
    image: postgres
"#,
        );

        let files = discover(tmp.path(), &DiscoverOptions::default())
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        let top = &files[0];
        assert!(top.is_root_candidate);
        assert_eq!(top.depth, 0);
        assert_eq!(top.service_count, 2);
        assert_eq!(top.services[0].first_host_port(), Some(8080));
        assert_eq!(top.services[1].first_host_port(), None);
        assert!(top.priority_score > 0);
    }

    #[tokio::test]
    async fn root_file_wins_over_nested_variant_with_more_services() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "docker-compose.yml",
            "services:\n  web:\n    image: nginx\n",
        );
        write(
            tmp.path(),
            "backend/docker-compose.dev.yml",
            r#"
services:
  api:
    image: api
  worker:
    image: worker
  db:
    image: postgres
"#,
        );

        let files = discover(tmp.path(), &DiscoverOptions::default())
            .await
            .unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].is_root_candidate);
        assert!(files[0].path.ends_with("docker-compose.yml"));
        assert_eq!(files[1].environment, Some(Environment::Development));
        assert_eq!(files[1].depth, 1);
    }

    #[tokio::test]
    async fn broken_file_still_ranks_with_zero_services() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "docker-compose.yml", "- not\n- a\n- mapping\n");
        write(
            tmp.path(),
            "svc/docker-compose.yml",
            "services:\n  api:\n    image: api\n",
        );

        let files = discover(tmp.path(), &DiscoverOptions::default())
            .await
            .unwrap();
        assert_eq!(files.len(), 2);
        // root still outranks, even with a parse failure
        assert!(files[0].is_root_candidate);
        assert_eq!(files[0].service_count, 0);
        assert!(files[0].parse_error.is_some());
        assert_eq!(files[1].service_count, 1);
    }

    #[tokio::test]
    async fn empty_tree_is_the_actionable_failure() {
        let tmp = TempDir::new().unwrap();
        let err = discover(tmp.path(), &DiscoverOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::NoCandidates(_)));
    }

    #[tokio::test]
    async fn excluded_dirs_do_not_contribute_candidates() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "node_modules/pkg/docker-compose.yml",
            "services:\n  x:\n    image: x\n",
        );
        let err = discover(tmp.path(), &DiscoverOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::NoCandidates(_)));
    }

    #[tokio::test]
    async fn discovery_is_deterministic_across_runs() {
        let tmp = TempDir::new().unwrap();
        for dir in ["a", "b", "c"] {
            write(
                tmp.path(),
                &format!("{dir}/docker-compose.yml"),
                "services:\n  s:\n    image: x\n",
            );
        }

        let first = discover(tmp.path(), &DiscoverOptions::default())
            .await
            .unwrap();
        let second = discover(tmp.path(), &DiscoverOptions::default())
            .await
            .unwrap();
        let paths = |files: &[DiscoveredFile]| {
            files.iter().map(|f| f.path.clone()).collect::<Vec<_>>()
        };
        assert_eq!(paths(&first), paths(&second));
    }
}
