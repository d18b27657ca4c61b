//! Workload definition: the task mix run by each virtual user.

use crate::error::LoadTestResult;
use crate::stats::EndpointKey;
use serde::{Deserialize, Serialize};

/// Compose creation endpoint.
pub const COMPOSE: EndpointKey = EndpointKey::new("POST", "/compose");
/// Package search endpoint.
pub const PACKAGES: EndpointKey = EndpointKey::new("GET", "/packages");
/// Distributions listing endpoint.
pub const DISTRIBUTIONS: EndpointKey = EndpointKey::new("GET", "/distributions");
/// Per-distribution architectures endpoint.
pub const ARCHITECTURES: EndpointKey = EndpointKey::new("GET", "/architectures/{distribution}");
/// Version probe endpoint.
pub const VERSION: EndpointKey = EndpointKey::new("GET", "/version");

/// One task a virtual user can execute per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// POST a fixed, representative compose request.
    Compose,
    /// Search packages with fixed query parameters.
    Packages,
    /// List distributions, then fetch architectures for each one returned.
    Distributions,
    /// Fetch the service version. Tagged debug: a slow /version points at the
    /// network rather than the service, so it is excluded from normal runs.
    Version,
}

impl Task {
    /// Relative selection weight within the mix.
    pub fn weight(self) -> f64 {
        1.0
    }

    /// Whether the task is a debug/diagnostic task.
    pub fn is_debug(self) -> bool {
        matches!(self, Task::Version)
    }

    /// The task mix for a run.
    pub fn mix(include_debug: bool) -> Vec<Task> {
        [Task::Compose, Task::Packages, Task::Distributions, Task::Version]
            .into_iter()
            .filter(|task| include_debug || !task.is_debug())
            .collect()
    }
}

/// Compose request payload.
#[derive(Debug, Clone, Serialize)]
pub struct ComposeRequest {
    pub distribution: String,
    pub image_requests: Vec<ImageRequest>,
    pub customizations: Customizations,
}

/// A single image build request.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest {
    pub architecture: String,
    pub image_type: String,
    pub upload_request: UploadRequest,
}

/// Upload destination for a built image.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest {
    #[serde(rename = "type")]
    pub upload_type: String,
    pub options: UploadOptions,
}

/// Provider-specific upload options.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOptions {
    pub share_with_accounts: Vec<String>,
}

/// Image customizations.
#[derive(Debug, Clone, Serialize)]
pub struct Customizations {
    pub packages: Vec<String>,
}

/// The fixed, representative compose request sent by the compose task.
pub fn compose_request() -> ComposeRequest {
    ComposeRequest {
        distribution: "centos-9".to_string(),
        image_requests: vec![ImageRequest {
            architecture: "x86_64".to_string(),
            image_type: "ami".to_string(),
            upload_request: UploadRequest {
                upload_type: "aws".to_string(),
                options: UploadOptions {
                    share_with_accounts: vec!["somebody".to_string()],
                },
            },
        }],
        customizations: Customizations {
            packages: vec!["idontexist".to_string()],
        },
    }
}

/// Fixed query parameters for the package search task.
pub const PACKAGE_SEARCH_QUERY: [(&str, &str); 3] = [
    ("distribution", "rhel-84"),
    ("architecture", "x86_64"),
    ("search", "qemu"),
];

/// One record from the distributions listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Distribution {
    /// Distribution name, e.g. "centos-9".
    pub name: String,
}

/// Parse the distributions listing body.
///
/// A malformed body is a task-level error surfaced to the caller, never
/// silently swallowed.
pub fn parse_distributions(body: &[u8]) -> LoadTestResult<Vec<Distribution>> {
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compose_request_shape() {
        let value = serde_json::to_value(compose_request()).unwrap();
        assert_eq!(
            value,
            json!({
                "distribution": "centos-9",
                "image_requests": [
                    {
                        "architecture": "x86_64",
                        "image_type": "ami",
                        "upload_request": {
                            "type": "aws",
                            "options": {
                                "share_with_accounts": ["somebody"]
                            }
                        }
                    }
                ],
                "customizations": {
                    "packages": ["idontexist"]
                }
            })
        );
    }

    #[test]
    fn test_mix_excludes_debug_tasks_by_default() {
        let mix = Task::mix(false);
        assert_eq!(mix, vec![Task::Compose, Task::Packages, Task::Distributions]);
    }

    #[test]
    fn test_mix_includes_debug_tasks_on_request() {
        let mix = Task::mix(true);
        assert!(mix.contains(&Task::Version));
        assert_eq!(mix.len(), 4);
    }

    #[test]
    fn test_parse_distributions() {
        let body = br#"[{"name":"centos-9"},{"name":"rhel-9"}]"#;
        let distributions = parse_distributions(body).unwrap();
        assert_eq!(distributions.len(), 2);
        assert_eq!(distributions[0].name, "centos-9");
        assert_eq!(distributions[1].name, "rhel-9");
    }

    #[test]
    fn test_parse_distributions_rejects_malformed_body() {
        assert!(parse_distributions(b"not json").is_err());
    }

    #[test]
    fn test_parse_distributions_ignores_extra_fields() {
        let body = br#"[{"name":"centos-9","description":"CentOS Stream 9"}]"#;
        let distributions = parse_distributions(body).unwrap();
        assert_eq!(distributions[0].name, "centos-9");
    }
}
