//! Chart definition and loading

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{CoreError, Result};

/// Chart metadata as declared in `Chart.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// API version (v1 or v2)
    pub api_version: String,

    /// Chart name (required)
    pub name: String,

    /// Chart version (required)
    pub version: String,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Application version
    #[serde(default)]
    pub app_version: Option<String>,

    /// Kubernetes version constraint
    #[serde(default)]
    pub kube_version: Option<String>,

    /// Chart type (application or library)
    #[serde(default, rename = "type")]
    pub chart_type: Option<String>,

    /// Home URL
    #[serde(default)]
    pub home: Option<String>,

    /// Icon URL
    #[serde(default)]
    pub icon: Option<String>,

    /// Source URLs
    #[serde(default)]
    pub sources: Vec<String>,

    /// Keywords
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Maintainers
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,

    /// Declared subchart dependencies
    #[serde(default)]
    pub dependencies: Vec<ChartDependency>,

    /// Annotations
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// Maintainer information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Subchart dependency entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDependency {
    /// Registered chart name
    pub name: String,

    /// Version constraint
    #[serde(default)]
    pub version: Option<String>,

    /// Repository URL
    #[serde(default)]
    pub repository: Option<String>,

    /// Dot-path condition controlling whether the subchart is enabled
    #[serde(default)]
    pub condition: Option<String>,

    /// Tags for conditional inclusion
    #[serde(default)]
    pub tags: Vec<String>,

    /// Alias name; subchart values nest under this instead of `name`
    #[serde(default)]
    pub alias: Option<String>,
}

impl ChartDependency {
    /// Name the subchart's values actually nest under
    #[inline]
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A chart loaded from disk: metadata plus its default values tree
#[derive(Debug, Clone)]
pub struct LoadedChart {
    /// Parsed Chart.yaml
    pub metadata: ChartMetadata,

    /// Root directory of the chart
    pub root: PathBuf,

    /// Parsed values.yaml (empty mapping when the file is absent)
    pub values: Value,
}

impl LoadedChart {
    /// Load a chart from a directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(CoreError::ChartNotFound {
                path: root.display().to_string(),
            });
        }

        let chart_file = root.join("Chart.yaml");
        if !chart_file.exists() {
            return Err(CoreError::ChartNotFound {
                path: chart_file.display().to_string(),
            });
        }

        let chart_content = std::fs::read_to_string(&chart_file)?;
        let metadata: ChartMetadata = serde_yaml::from_str(&chart_content)?;

        if metadata.api_version != "v1" && metadata.api_version != "v2" {
            return Err(CoreError::InvalidChart {
                message: format!(
                    "Unsupported apiVersion: {}. Expected v1 or v2",
                    metadata.api_version
                ),
            });
        }
        if metadata.name.is_empty() {
            return Err(CoreError::InvalidChart {
                message: "Chart.yaml has an empty name".to_string(),
            });
        }

        let values = Self::load_values_file(&root.join("values.yaml"))?;

        Ok(Self {
            metadata,
            root,
            values,
        })
    }

    /// Parse a values file into a value tree
    ///
    /// A missing file, an empty file, and a file containing only comments
    /// all produce an empty mapping.
    pub fn load_values_file(path: &Path) -> Result<Value> {
        if !path.exists() {
            return Ok(Value::Mapping(serde_yaml::Mapping::new()));
        }
        let content = std::fs::read_to_string(path)?;
        let parsed: Value = serde_yaml::from_str(&content)?;
        Ok(match parsed {
            Value::Null => Value::Mapping(serde_yaml::Mapping::new()),
            other => other,
        })
    }

    /// Look up a dependency by its registered name
    pub fn dependency(&self, name: &str) -> Option<&ChartDependency> {
        self.metadata.dependencies.iter().find(|d| d.name == name)
    }
}
