use anyhow::Result;
use std::path::Path;
use tokio::process::Command;

pub fn resolve_compose_binary() -> String {
    std::env::var("DOCKER_BIN").unwrap_or_else(|_| "docker".to_string())
}

/// Arguments for the compose binary, taken from the persisted invocation
/// string minus its leading binary token (DOCKER_BIN may substitute it).
pub fn invocation_args(invocation: &str) -> Vec<String> {
    invocation
        .split_whitespace()
        .skip(1)
        .map(|s| s.to_string())
        .collect()
}

/// Run a compose subcommand with inherited stdio and hand back the exit
/// code. Container lifecycle stays entirely with the external tool; this
/// crate only assembles the argument list.
pub async fn run_passthrough(root: &Path, invocation: &str, extra: &[String]) -> Result<i32> {
    let bin = resolve_compose_binary();
    let mut args = invocation_args(invocation);
    args.extend_from_slice(extra);

    let status = Command::new(&bin)
        .current_dir(root)
        .args(&args)
        .envs(std::env::vars())
        .status()
        .await?;
    Ok(status.code().unwrap_or(if status.success() { 0 } else { 1 }))
}
