use crate::compose::{self, FileSummary};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    ParseError,
    MissingImage,
    DanglingDependency,
    DuplicatePort,
    MalformedService,
}

impl FindingCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCode::ParseError => "PARSE_ERROR",
            FindingCode::MissingImage => "MISSING_IMAGE",
            FindingCode::DanglingDependency => "DANGLING_DEPENDENCY",
            FindingCode::DuplicatePort => "DUPLICATE_PORT",
            FindingCode::MalformedService => "MALFORMED_SERVICE",
        }
    }
}

/// One structural problem. Findings are data: validation never fails, the
/// caller decides how to render the report.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationFinding {
    pub severity: Severity,
    pub code: FindingCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub message: String,
}

impl ValidationFinding {
    fn new(
        severity: Severity,
        code: FindingCode,
        service: Option<&str>,
        message: String,
    ) -> Self {
        ValidationFinding {
            severity,
            code,
            service: service.map(|s| s.to_string()),
            message,
        }
    }
}

/// Re-parse `path` and report its structural problems.
pub fn validate(path: &Path) -> Vec<ValidationFinding> {
    match compose::parse_file(path) {
        Err(failure) => vec![ValidationFinding::new(
            Severity::Error,
            FindingCode::ParseError,
            None,
            format!("{}: {failure}", path.display()),
        )],
        Ok(summary) => validate_summary(&summary),
    }
}

/// Findings for an already-parsed summary: services without an image or
/// build, dependency edges pointing outside the file, host ports claimed
/// more than once, and entries the parser had to skip.
pub fn validate_summary(summary: &FileSummary) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();

    let defined: BTreeSet<&str> = summary.services.iter().map(|s| s.name.as_str()).collect();

    for service in &summary.services {
        if service.image.is_none() && service.build_context.is_none() {
            findings.push(ValidationFinding::new(
                Severity::Error,
                FindingCode::MissingImage,
                Some(&service.name),
                format!("service '{}' declares neither image nor build", service.name),
            ));
        }

        for dep in &service.depends_on {
            if !defined.contains(dep.service.as_str()) {
                findings.push(ValidationFinding::new(
                    Severity::Error,
                    FindingCode::DanglingDependency,
                    Some(&service.name),
                    format!(
                        "service '{}' depends on '{}', which is not defined in this file",
                        service.name, dep.service
                    ),
                ));
            }
        }
    }

    // one finding per duplicated host port, naming every claimant
    let mut port_claims: BTreeMap<u16, Vec<&str>> = BTreeMap::new();
    for service in &summary.services {
        for port in &service.ports {
            if let Some(host) = port.host_port {
                port_claims.entry(host).or_default().push(&service.name);
            }
        }
    }
    for (port, claimants) in port_claims {
        if claimants.len() > 1 {
            findings.push(ValidationFinding::new(
                Severity::Warning,
                FindingCode::DuplicatePort,
                None,
                format!("host port {port} is declared by {}", claimants.join(", ")),
            ));
        }
    }

    for name in &summary.skipped {
        findings.push(ValidationFinding::new(
            Severity::Warning,
            FindingCode::MalformedService,
            Some(name),
            format!("service entry '{name}' could not be parsed and was skipped"),
        ));
    }

    findings
}
