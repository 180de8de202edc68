use crate::compose::ServiceSummary;
use crate::config::{self, default_restart, ProjectConfiguration, ServiceEntry};
use crate::discovery::DiscoveredFile;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

// Names the compose tool picks up without -f.
const DEFAULT_FILE_NAMES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Merge the winning candidate's summaries into a configuration. Pure
/// value-in, value-out: the caller owns persistence.
///
/// Entries marked `detected` are refreshed from the new summary; entries
/// the user authored (no flag) are left untouched. Re-running over an
/// unchanged tree yields an equal configuration.
pub fn synthesize(
    winning: &DiscoveredFile,
    existing: Option<ProjectConfiguration>,
    root: &Path,
) -> ProjectConfiguration {
    let mut config = existing.unwrap_or_else(|| ProjectConfiguration {
        project_name: project_name_from_root(root),
        services: Default::default(),
        compose_invocation: String::new(),
    });

    config.compose_invocation = compose_invocation(winning);

    for summary in &winning.services {
        match config.services.get_mut(&summary.name) {
            None => {
                config
                    .services
                    .insert(summary.name.clone(), detected_entry(summary));
            }
            Some(entry) if entry.detected => {
                // auto-detected values may drift as the compose file evolves
                entry.port = summary.first_host_port();
                entry.description = describe(summary);
                entry.health_check = summary.health_check.clone();
            }
            Some(_) => {} // user-authored, never overwritten
        }
    }

    config
}

fn detected_entry(summary: &ServiceSummary) -> ServiceEntry {
    ServiceEntry {
        port: summary.first_host_port(),
        description: describe(summary),
        detected: true,
        health_check: summary.health_check.clone(),
        restart: summary.restart.clone().unwrap_or_else(default_restart),
        scale: 1,
    }
}

fn describe(summary: &ServiceSummary) -> String {
    if let Some(image) = &summary.image {
        format!("image {image}")
    } else if let Some(context) = &summary.build_context {
        format!("built from {context}")
    } else {
        "no image or build configured".to_string()
    }
}

/// The invocation only needs `-f` when the winner is not a default-named
/// file at the root; the compose tool finds those on its own.
pub fn compose_invocation(winning: &DiscoveredFile) -> String {
    let name = winning
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    if winning.is_root_candidate && DEFAULT_FILE_NAMES.contains(&name) {
        "docker compose".to_string()
    } else {
        format!("docker compose -f {}", winning.relative_path.display())
    }
}

pub fn project_name_from_root(root: &Path) -> String {
    root.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project")
        .to_string()
}

/// Serializes read-merge-write against one configuration file. Overlapping
/// refreshes would otherwise race and silently drop newly detected
/// services.
pub struct Synthesizer {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Synthesizer {
    pub fn new(path: PathBuf) -> Self {
        Synthesizer {
            path,
            lock: Mutex::new(()),
        }
    }

    pub async fn refresh(
        &self,
        winning: &DiscoveredFile,
        root: &Path,
    ) -> Result<ProjectConfiguration, ConfigError> {
        let _guard = self.lock.lock().await;
        let existing = config::load(&self.path)?;
        let next = synthesize(winning, existing, root);
        config::save(&self.path, &next)?;
        info!(
            "configuration for '{}' written to {}",
            next.project_name,
            self.path.display()
        );
        Ok(next)
    }
}
