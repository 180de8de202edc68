use crate::env::interpolate;
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Why a candidate file contributed zero services. None of these abort a
/// scan; the file simply ranks with an empty summary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("cannot read file: {0}")]
    Unreadable(String),

    #[error("file is empty")]
    Empty,

    #[error("YAML syntax error: {0}")]
    Syntax(String),

    #[error("top-level document is not a mapping")]
    NotAMapping,

    #[error("document has no services section")]
    NoServices,
}

/// Everything extracted from one compose document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileSummary {
    pub services: Vec<ServiceSummary>,
    /// Names of service entries that could not be normalized and were
    /// skipped; surfaced later by validation.
    pub skipped: Vec<String>,
}

/// One service declaration, normalized out of the document's loose shape.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceSummary {
    pub name: String,
    pub image: Option<String>,
    pub build_context: Option<String>,
    pub ports: Vec<PortMapping>,
    pub depends_on: Vec<Dependency>,
    pub networks: BTreeSet<String>,
    pub volumes: BTreeSet<String>,
    pub restart: Option<String>,
    pub health_check: Option<String>,
}

impl ServiceSummary {
    /// First declared host port, if any mapping exposes one.
    pub fn first_host_port(&self) -> Option<u16> {
        self.ports.iter().find_map(|p| p.host_port)
    }
}

/// Normalized port mapping. `host_port` is absent for dynamically published
/// or container-only declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortMapping {
    pub host_port: Option<u16>,
    pub container_port: u16,
    pub protocol: String,
}

/// A `depends_on` edge. Long-form conditions (`service_healthy`, ...) are
/// recorded verbatim and not interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub service: String,
    pub condition: Option<String>,
}

/// Port declaration as it appears in the document, before normalization.
/// Compose allows `"8080:80"`, a bare number, or a long-syntax mapping; the
/// union keeps the engine strongly typed while absorbing all three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSpec {
    Shorthand(String),
    Structured {
        host: Option<u16>,
        container: Option<u16>,
        protocol: Option<String>,
    },
}

impl PortSpec {
    fn from_yaml(value: &Value) -> Option<PortSpec> {
        match value {
            Value::String(s) => Some(PortSpec::Shorthand(s.clone())),
            Value::Number(n) => n.as_u64().map(|n| PortSpec::Shorthand(n.to_string())),
            Value::Mapping(m) => Some(PortSpec::Structured {
                host: port_number(m.get("published")),
                container: port_number(m.get("target")),
                protocol: m
                    .get("protocol")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
            }),
            _ => None,
        }
    }

    fn normalize(self) -> Option<PortMapping> {
        match self {
            PortSpec::Shorthand(raw) => {
                let expanded = interpolate(&raw);
                // trailing "/udp" style protocol marker
                let (spec, protocol) = match expanded.split_once('/') {
                    Some((spec, proto)) => (spec, proto.to_lowercase()),
                    None => (expanded.as_str(), "tcp".to_string()),
                };
                let segments: Vec<&str> = spec.split(':').collect();
                match segments.as_slice() {
                    [container] => Some(PortMapping {
                        host_port: None,
                        container_port: container.trim().parse().ok()?,
                        protocol,
                    }),
                    // host-ip:host-port:container-port collapses to the
                    // rightmost two segments
                    [.., host, container] => Some(PortMapping {
                        host_port: host.trim().parse().ok(),
                        container_port: container.trim().parse().ok()?,
                        protocol,
                    }),
                    _ => None,
                }
            }
            PortSpec::Structured {
                host,
                container,
                protocol,
            } => Some(PortMapping {
                host_port: host,
                container_port: container?,
                protocol: protocol.unwrap_or_else(|| "tcp".to_string()),
            }),
        }
    }
}

fn port_number(value: Option<&Value>) -> Option<u16> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => interpolate(s).trim().parse().ok(),
        _ => None,
    }
}

/// Parse one compose file into a normalized summary.
pub fn parse_file(path: &Path) -> Result<FileSummary, ParseFailure> {
    let content =
        fs::read_to_string(path).map_err(|e| ParseFailure::Unreadable(e.to_string()))?;
    parse_str(&content)
}

pub fn parse_str(content: &str) -> Result<FileSummary, ParseFailure> {
    if content.trim().is_empty() {
        return Err(ParseFailure::Empty);
    }

    let doc: Value =
        serde_yaml::from_str(content).map_err(|e| ParseFailure::Syntax(e.to_string()))?;

    let root = match doc {
        Value::Mapping(m) => m,
        _ => return Err(ParseFailure::NotAMapping),
    };

    let services = match root.get("services") {
        Some(Value::Mapping(m)) => m,
        _ => return Err(ParseFailure::NoServices),
    };

    let mut summary = FileSummary::default();
    for (key, config) in services {
        let name = match key.as_str() {
            Some(n) => n.to_string(),
            None => continue,
        };
        match parse_service(&name, config) {
            Some(service) => summary.services.push(service),
            None => summary.skipped.push(name),
        }
    }

    Ok(summary)
}

/// Normalize a single service entry. Returns `None` when the entry cannot
/// be treated as a service at all; the caller records it as skipped.
fn parse_service(name: &str, config: &Value) -> Option<ServiceSummary> {
    let config = config.as_mapping()?;

    let image = config
        .get("image")
        .and_then(|v| v.as_str())
        .map(interpolate);

    let build_context = match config.get("build") {
        Some(Value::String(context)) => Some(context.clone()),
        Some(Value::Mapping(build)) => Some(
            build
                .get("context")
                .and_then(|c| c.as_str())
                .unwrap_or(".")
                .to_string(),
        ),
        _ => None,
    };

    let mut ports = Vec::new();
    if let Some(Value::Sequence(entries)) = config.get("ports") {
        for entry in entries {
            // ports that resist normalization are dropped, not fatal
            if let Some(mapping) = PortSpec::from_yaml(entry).and_then(PortSpec::normalize) {
                ports.push(mapping);
            }
        }
    }

    let depends_on = config
        .get("depends_on")
        .map(parse_depends)
        .unwrap_or_default();

    let networks = config
        .get("networks")
        .map(string_set)
        .unwrap_or_default();
    let volumes = config
        .get("volumes")
        .map(string_set)
        .unwrap_or_default();

    let restart = config
        .get("restart")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let health_check = config
        .get("healthcheck")
        .and_then(|v| v.as_mapping())
        .and_then(|h| h.get("test"))
        .and_then(health_test);

    Some(ServiceSummary {
        name: name.to_string(),
        image,
        build_context,
        ports,
        depends_on,
        networks,
        volumes,
        restart,
        health_check,
    })
}

/// `depends_on` is either a plain sequence of names or a mapping carrying a
/// per-dependency condition.
fn parse_depends(value: &Value) -> Vec<Dependency> {
    match value {
        Value::Sequence(entries) => entries
            .iter()
            .filter_map(|e| e.as_str())
            .map(|service| Dependency {
                service: service.to_string(),
                condition: None,
            })
            .collect(),
        Value::Mapping(entries) => entries
            .iter()
            .filter_map(|(k, v)| {
                let service = k.as_str()?.to_string();
                let condition = v
                    .as_mapping()
                    .and_then(|m| m.get("condition"))
                    .and_then(|c| c.as_str())
                    .map(|s| s.to_string());
                Some(Dependency { service, condition })
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Referenced names given either as a sequence or as mapping keys. Volume
/// shorthand strings (`./data:/var/lib`) keep only the source side.
fn string_set(value: &Value) -> BTreeSet<String> {
    match value {
        Value::Sequence(entries) => entries
            .iter()
            .filter_map(|e| e.as_str())
            .map(|s| s.split(':').next().unwrap_or(s).to_string())
            .collect(),
        Value::Mapping(entries) => entries
            .iter()
            .filter_map(|(k, _)| k.as_str())
            .map(|s| s.to_string())
            .collect(),
        _ => BTreeSet::new(),
    }
}

fn health_test(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Sequence(parts) => {
            let joined: Vec<&str> = parts.iter().filter_map(|p| p.as_str()).collect();
            if joined.is_empty() {
                None
            } else {
                Some(joined.join(" "))
            }
        }
        _ => None,
    }
}
