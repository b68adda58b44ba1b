//! Vendor Manifest - per-theme third-party assets
//!
//! ```json
//! {
//!   "styles":  { "main": "node_modules/slick/slick.css" },
//!   "scripts": { "main": ["node_modules/jquery/dist/jquery.js", "vendor/*.js"] },
//!   "copy":    { "node_modules/icons/fonts/*": "fonts" }
//! }
//! ```
//!
//! Every key is optional. Glob values are validated lazily via [`GlobCheck`],
//! so a bad entry only disables its own task.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::config::Config;
use crate::error::ManifestError;
use crate::globs::GlobCheck;

/// Vendor manifests keyed by theme name
pub type Manifests = HashMap<String, VendorManifest>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VendorManifest {
    #[serde(default)]
    styles: Option<HashMap<String, Value>>,
    #[serde(default)]
    scripts: Option<HashMap<String, Value>>,
    #[serde(default)]
    copy: Option<BTreeMap<String, String>>,
}

impl VendorManifest {
    /// Read and parse the manifest of `theme`
    pub fn load(theme: &str, path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            theme: theme.to_string(),
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            theme: theme.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }

    /// Vendor stylesheet globs for a build set
    pub fn styles(&self, build_set: &str) -> GlobCheck {
        GlobCheck::from_value(self.styles.as_ref().and_then(|m| m.get(build_set)))
    }

    /// Vendor script globs for a build set
    pub fn scripts(&self, build_set: &str) -> GlobCheck {
        GlobCheck::from_value(self.scripts.as_ref().and_then(|m| m.get(build_set)))
    }

    /// Copy table as (glob, destination) pairs, sorted by glob
    pub fn copies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.copy
            .iter()
            .flatten()
            .map(|(glob, dest)| (glob.as_str(), dest.as_str()))
    }
}

/// Load every theme's manifest. Any failure aborts startup.
pub fn load_manifests(config: &Config) -> Result<Manifests, ManifestError> {
    config
        .themes
        .iter()
        .map(|theme| {
            let manifest = VendorManifest::load(&theme.name, &theme.paths.vendor)?;
            tracing::debug!(
                "Loaded vendor manifest for {} from {:?}",
                theme.name,
                theme.paths.vendor
            );
            Ok((theme.name.clone(), manifest))
        })
        .collect()
}
