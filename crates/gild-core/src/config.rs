//! Project Configuration - themes, build sets and the path table
//!
//! Loaded once at startup from `gild.json` (optional). Without it the layout
//! is derived from `package.json`'s `name`: `web/app/themes/{name}`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default config file name, looked up in the project root
pub const CONFIG_FILE: &str = "gild.json";

/// Paths used by one theme
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThemePaths {
    pub styles: PathBuf,
    pub scripts: PathBuf,
    pub plugins: PathBuf,
    pub build: PathBuf,
    /// Vendor manifest file
    pub vendor: PathBuf,
}

impl ThemePaths {
    /// Conventional layout below a theme directory
    pub fn under(theme_dir: &Path) -> Self {
        Self {
            styles: theme_dir.join("styles"),
            scripts: theme_dir.join("scripts"),
            plugins: theme_dir.join("functions").join("plugins"),
            build: theme_dir.join("_"),
            vendor: theme_dir.join("vendor.json"),
        }
    }

    fn resolve(&self, root: &Path) -> Self {
        Self {
            styles: root.join(&self.styles),
            scripts: root.join(&self.scripts),
            plugins: root.join(&self.plugins),
            build: root.join(&self.build),
            vendor: root.join(&self.vendor),
        }
    }
}

/// External commands for the CSS prefixer and the JS minifier
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolchainConfig {
    /// Reads CSS on stdin, writes prefixed CSS on stdout. Unset means pass-through.
    #[serde(default)]
    pub prefixer: Option<Vec<String>>,
    /// Reads JS on stdin, writes minified JS on stdout
    #[serde(default = "default_minifier")]
    pub minifier: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            prefixer: None,
            minifier: default_minifier(),
        }
    }
}

fn default_minifier() -> Vec<String> {
    ["esbuild", "--minify", "--legal-comments=inline", "--loader=js"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_themes() -> Vec<String> {
    vec!["parent".to_string()]
}

fn default_build_sets() -> Vec<String> {
    ["main", "login", "admin"].into_iter().map(String::from).collect()
}

fn default_plugin_kinds() -> Vec<String> {
    ["main", "admin", "editor"].into_iter().map(String::from).collect()
}

fn default_node_modules() -> PathBuf {
    PathBuf::from("node_modules")
}

/// On-disk shape of `gild.json`
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default = "default_themes")]
    themes: Vec<String>,
    #[serde(default = "default_build_sets")]
    build_sets: Vec<String>,
    #[serde(default = "default_plugin_kinds")]
    plugin_kinds: Vec<String>,
    #[serde(default = "default_node_modules")]
    node_modules: PathBuf,
    #[serde(default)]
    paths: BTreeMap<String, ThemePaths>,
    #[serde(default)]
    toolchain: ToolchainConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            themes: default_themes(),
            build_sets: default_build_sets(),
            plugin_kinds: default_plugin_kinds(),
            node_modules: default_node_modules(),
            paths: BTreeMap::new(),
            toolchain: ToolchainConfig::default(),
        }
    }
}

/// package.json structure (minimal)
#[derive(Debug, Deserialize)]
struct PackageJson {
    name: Option<String>,
}

/// One theme with its resolved (absolute) paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    pub paths: ThemePaths,
}

/// Immutable project configuration threaded through graph construction
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub themes: Vec<Theme>,
    pub build_sets: Vec<String>,
    pub plugin_kinds: Vec<String>,
    pub node_modules: PathBuf,
    pub toolchain: ToolchainConfig,
    /// Production build: minify scripts
    pub production: bool,
}

impl Config {
    /// Load the configuration for the project at `root`.
    ///
    /// `explicit` points at a config file that must exist; otherwise
    /// `{root}/gild.json` is used when present.
    pub fn load(
        root: impl AsRef<Path>,
        explicit: Option<&Path>,
        production: bool,
    ) -> Result<Self, ConfigError> {
        let root = root.as_ref().to_path_buf();

        let file = match explicit {
            Some(path) => Some(read_config(&root.join(path))?),
            None => {
                let path = root.join(CONFIG_FILE);
                if path.exists() {
                    Some(read_config(&path)?)
                } else {
                    None
                }
            }
        };

        let file = match file {
            Some(file) => file,
            None => {
                tracing::debug!("No {} found, using defaults", CONFIG_FILE);
                ConfigFile::default()
            }
        };

        Self::from_file(root, file, production)
    }

    fn from_file(root: PathBuf, file: ConfigFile, production: bool) -> Result<Self, ConfigError> {
        if file.themes.is_empty() {
            return Err(ConfigError::Empty("themes"));
        }
        if file.build_sets.is_empty() {
            return Err(ConfigError::Empty("build sets"));
        }

        for name in &file.themes {
            check_name("theme", name)?;
            check_reserved("theme", name, &RESERVED_THEMES)?;
        }
        for name in &file.build_sets {
            check_name("build set", name)?;
            check_reserved("build set", name, &RESERVED_BUILD_SETS)?;
        }
        for name in &file.plugin_kinds {
            check_name("plugin kind", name)?;
        }

        let mut paths = file.paths;
        if paths.is_empty() && file.themes.len() == 1 {
            let package = package_name(&root)?;
            let theme_dir = Path::new("web").join("app").join("themes").join(package);
            paths.insert(file.themes[0].clone(), ThemePaths::under(&theme_dir));
        }

        let themes = file
            .themes
            .iter()
            .map(|name| {
                paths
                    .get(name)
                    .map(|p| Theme {
                        name: name.clone(),
                        paths: p.resolve(&root),
                    })
                    .ok_or_else(|| ConfigError::MissingPaths(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            node_modules: root.join(file.node_modules),
            root,
            themes,
            build_sets: file.build_sets,
            plugin_kinds: file.plugin_kinds,
            toolchain: file.toolchain,
            production,
        })
    }
}

fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn package_name(root: &Path) -> Result<String, ConfigError> {
    let path = root.join("package.json");
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let pkg: PackageJson =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?;

    pkg.name
        .filter(|n| !n.trim().is_empty())
        .ok_or(ConfigError::MissingPackageName)
}

/// Names end up inside dotted task names, so keep them unambiguous
fn check_name(what: &'static str, name: &str) -> Result<(), ConfigError> {
    let bad = name.is_empty()
        || name
            .chars()
            .any(|c| c == '.' || c == '[' || c == ']' || c.is_whitespace());

    if bad {
        return Err(ConfigError::InvalidName {
            what,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Theme names that would read as a root or asset kind task
const RESERVED_THEMES: [&str; 6] = ["default", "clean", "watch", "styles", "scripts", "vendor"];

/// `<theme>.styles.plugins` is the plugin stylesheet aggregate
const RESERVED_BUILD_SETS: [&str; 1] = ["plugins"];

fn check_reserved(what: &'static str, name: &str, reserved: &[&str]) -> Result<(), ConfigError> {
    if reserved.contains(&name) {
        return Err(ConfigError::InvalidName {
            what,
            name: name.to_string(),
        });
    }
    Ok(())
}
