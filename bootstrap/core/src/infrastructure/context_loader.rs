// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Bootstrap Context Manifest
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) describing one
// subscriber: its account, region and name, the external id and role the
// host assumes from, enabled releases, and the cdk bootstrap settings.
//
// ```yaml
// apiVersion: fastish.io/v1
// kind: BootstrapContext
// metadata:
//   name: acme-production
// spec:
//   host:
//     account: "111111111111"
//   subscriber:
//     account: "123456789012"
//     region: us-east-1
//     name: acme
//     externalId: ext-1
//     subscriberRoleArn: arn:aws:iam::111111111111:role/sub
//     releases: [webapp]
//   cdk:
//     version: "21"
// ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::target::{ContextError, RawTargetContext, TargetContext};

pub const API_VERSION: &str = "fastish.io/v1";
pub const KIND: &str = "BootstrapContext";

/// Top-level bootstrap context manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapContextManifest {
    /// API version (must be "fastish.io/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "BootstrapContext")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: BootstrapContextSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

/// Everything under `spec:`. Tenant fields stay optional here so that a
/// missing one is reported by context resolution with its field name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapContextSpec {
    #[serde(default)]
    pub host: HostSpec,

    #[serde(default)]
    pub subscriber: SubscriberSpec,

    #[serde(default)]
    pub cdk: CdkSpec,

    /// Resource name prefix (default "fastish")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(default)]
    pub preflight: PreflightSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostSpec {
    pub account: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberSpec {
    pub account: Option<String>,
    pub region: Option<String>,
    pub name: Option<String>,
    pub external_id: Option<String>,
    pub subscriber_role_arn: Option<String>,
    #[serde(default)]
    pub releases: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdkSpec {
    /// Written to the version parameter (default "0")
    pub version: Option<String>,

    /// Default-bootstrap qualifier (default "hnb659fds")
    pub qualifier: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreflightSpec {
    /// Fail instead of warn on dangling default-bootstrap references
    #[serde(default)]
    pub strict: bool,
}

impl BootstrapContextManifest {
    /// Load manifest from a YAML (or JSON) file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest = serde_yaml::from_str(&content)?;
        Ok(manifest)
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let manifest = serde_yaml::from_str(yaml)?;
        Ok(manifest)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover the manifest using precedence order
    /// 1. FASTISH_CONTEXT_PATH environment variable
    /// 2. ./fastish-context.yaml (working directory)
    /// 3. ~/.fastish/context.yaml (user home)
    /// 4. /etc/fastish/context.yaml (system, Unix) or C:\ProgramData\Fastish\context.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        // 1. Environment variable
        if let Ok(path) = std::env::var("FASTISH_CONTEXT_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Working directory
        let cwd = PathBuf::from("./fastish-context.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        // 3. User home
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".fastish").join("context.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        // 4. System config
        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/fastish/context.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Fastish\\context.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load the manifest from an explicit path or by discovery, then apply
    /// environment overrides. There is no default tenant, so finding nothing
    /// is an error.
    pub fn load(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = match cli_path {
            Some(path) => {
                tracing::info!("Loading bootstrap context from explicit path: {:?}", path);
                path
            }
            None => {
                let path = Self::discover_config().ok_or(ContextError::Configuration {
                    field: "context",
                    reason: "is missing",
                })?;
                tracing::info!("Loading bootstrap context from discovered path: {:?}", path);
                path
            }
        };

        let mut manifest = Self::from_yaml_file(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load bootstrap context at {:?}: {}", path, e))?;
        manifest.apply_env_overrides();
        Ok(manifest)
    }

    /// Apply FASTISH_* environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let subscriber = &mut self.spec.subscriber;
        let fields: [(&str, &mut Option<String>); 6] = [
            ("FASTISH_ACCOUNT", &mut subscriber.account),
            ("FASTISH_REGION", &mut subscriber.region),
            ("FASTISH_NAME", &mut subscriber.name),
            ("FASTISH_EXTERNAL_ID", &mut subscriber.external_id),
            ("FASTISH_SUBSCRIBER_ROLE_ARN", &mut subscriber.subscriber_role_arn),
            ("FASTISH_HOST_ACCOUNT", &mut self.spec.host.account),
        ];
        for (key, slot) in fields {
            if let Some(val) = lookup(key) {
                tracing::info!("Environment override: {}", key);
                *slot = Some(val);
            }
        }

        if let Some(val) = lookup("FASTISH_RELEASES") {
            tracing::info!("Environment override: FASTISH_RELEASES={}", val);
            self.spec.subscriber.releases = val
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(val) = lookup("FASTISH_STRICT_PREFLIGHT") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => {
                    tracing::info!("Environment override: FASTISH_STRICT_PREFLIGHT=true");
                    self.spec.preflight.strict = true;
                }
                "false" | "0" | "no" | "off" => {
                    tracing::info!("Environment override: FASTISH_STRICT_PREFLIGHT=false");
                    self.spec.preflight.strict = false;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for FASTISH_STRICT_PREFLIGHT: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate the manifest envelope. Tenant fields are checked by [`Self::resolve`].
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.trim().is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        Ok(())
    }

    pub fn raw_context(&self) -> RawTargetContext {
        let subscriber = &self.spec.subscriber;
        RawTargetContext {
            account: subscriber.account.clone(),
            region: subscriber.region.clone(),
            name: subscriber.name.clone(),
            external_id: subscriber.external_id.clone(),
            subscriber_role_arn: subscriber.subscriber_role_arn.clone(),
            releases: subscriber.releases.clone(),
            version: self.spec.cdk.version.clone(),
            host_account: self.spec.host.account.clone(),
            scope: self.spec.scope.clone(),
            qualifier: self.spec.cdk.qualifier.clone(),
        }
    }

    pub fn resolve(&self) -> Result<TargetContext, ContextError> {
        TargetContext::resolve(self.raw_context())
    }

    pub fn strict_preflight(&self) -> bool {
        self.spec.preflight.strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::target::Capability;
    use std::collections::HashMap;
    use std::io::Write;

    const MANIFEST: &str = r#"
apiVersion: fastish.io/v1
kind: BootstrapContext
metadata:
  name: acme-production
spec:
  host:
    account: "111111111111"
  subscriber:
    account: "123456789012"
    region: us-east-1
    name: acme
    externalId: ext-1
    subscriberRoleArn: arn:aws:iam::111111111111:role/sub
    releases: [webapp]
  cdk:
    version: "21"
"#;

    #[test]
    fn test_parse_and_resolve() {
        let manifest = BootstrapContextManifest::from_yaml_str(MANIFEST).unwrap();
        assert!(manifest.validate().is_ok());
        assert!(!manifest.strict_preflight());

        let ctx = manifest.resolve().unwrap();
        assert_eq!(ctx.account(), "123456789012");
        assert_eq!(ctx.host().account, "111111111111");
        assert_eq!(ctx.version(), "21");
        assert_eq!(ctx.scope(), "fastish");
        assert!(ctx.is_enabled(Capability::Webapp));
        assert!(!ctx.is_enabled(Capability::Druid));
    }

    #[test]
    fn test_json_manifest_is_accepted() {
        let json = serde_json::json!({
            "apiVersion": "fastish.io/v1",
            "kind": "BootstrapContext",
            "metadata": { "name": "acme" },
            "spec": {
                "host": { "account": "111111111111" },
                "subscriber": {
                    "account": "123456789012",
                    "region": "eu-west-1",
                    "name": "acme",
                    "externalId": "ext",
                    "subscriberRoleArn": "arn:aws:iam::111111111111:role/sub"
                },
                "preflight": { "strict": true }
            }
        });
        let manifest = BootstrapContextManifest::from_yaml_str(&json.to_string()).unwrap();
        assert!(manifest.strict_preflight());
        assert!(manifest.resolve().unwrap().releases().is_empty());
    }

    #[test]
    fn test_missing_external_id_names_field() {
        let yaml = MANIFEST.replace("    externalId: ext-1\n", "");
        let manifest = BootstrapContextManifest::from_yaml_str(&yaml).unwrap();
        let err = manifest.resolve().unwrap_err();
        assert_eq!(
            err,
            ContextError::Configuration {
                field: "externalId",
                reason: "is missing",
            }
        );
    }

    #[test]
    fn test_validation() {
        let mut manifest = BootstrapContextManifest::from_yaml_str(MANIFEST).unwrap();

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.metadata.name = " ".to_string();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut manifest = BootstrapContextManifest::from_yaml_str(MANIFEST).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("FASTISH_REGION", "eu-central-1"),
            ("FASTISH_RELEASES", "druid, webapp,"),
            ("FASTISH_STRICT_PREFLIGHT", "yes"),
        ]);
        manifest.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(manifest.spec.subscriber.region.as_deref(), Some("eu-central-1"));
        assert_eq!(manifest.spec.subscriber.releases, vec!["druid", "webapp"]);
        assert!(manifest.strict_preflight());
        assert_eq!(manifest.spec.subscriber.account.as_deref(), Some("123456789012"));
    }

    #[test]
    fn test_invalid_strict_override_is_ignored() {
        let mut manifest = BootstrapContextManifest::from_yaml_str(MANIFEST).unwrap();
        manifest.apply_overrides_from(|key| {
            (key == "FASTISH_STRICT_PREFLIGHT").then(|| "maybe".to_string())
        });
        assert!(!manifest.strict_preflight());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let manifest = BootstrapContextManifest::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(manifest.metadata.name, "acme-production");
    }

    #[test]
    fn test_discovery_prefers_environment_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        std::env::set_var("FASTISH_CONTEXT_PATH", file.path());

        let discovered = BootstrapContextManifest::discover_config();
        let manifest = BootstrapContextManifest::load(None);
        std::env::remove_var("FASTISH_CONTEXT_PATH");

        assert_eq!(discovered.as_deref(), Some(file.path()));
        assert_eq!(manifest.unwrap().metadata.name, "acme-production");
    }

    #[test]
    fn test_load_from_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        let err = BootstrapContextManifest::load(Some(missing)).unwrap_err();
        assert!(err.to_string().contains("Failed to load bootstrap context"));
    }
}
