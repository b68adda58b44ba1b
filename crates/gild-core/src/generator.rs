//! Task Graph Generator
//!
//! Turns the configuration table and vendor manifests into a registry:
//!
//! - leaves per (theme, build set, kind), plugin kind and copy entry
//! - per-theme aggregates, then per-kind global aggregates
//! - the `clean`, `default` and `watch` roots
//!
//! Every build task runs its clean counterpart first, at every level.

use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::action::Action;
use crate::config::{Config, Theme};
use crate::error::GraphError;
use crate::globs::{self, GlobCheck};
use crate::graph;
use crate::key::{AssetKind, Role, TaskKey, Variant};
use crate::manifest::{Manifests, VendorManifest};
use crate::registry::{TaskDef, TaskRegistry};

/// Generate and validate the complete task graph
pub fn build_graph(config: &Config, manifests: &Manifests) -> Result<TaskRegistry, GraphError> {
    let mut generator = Generator::new(config);
    let mut has_copies = false;

    for theme in &config.themes {
        let manifest = manifests
            .get(&theme.name)
            .ok_or_else(|| GraphError::MissingManifest(theme.name.clone()))?;

        generator.register_clean_task(theme)?;

        for set in &config.build_sets {
            generator.register_asset_pipeline(theme, set, AssetKind::Styles)?;
            generator.register_asset_pipeline(theme, set, AssetKind::Scripts)?;
            generator.register_vendor_pipeline(theme, manifest, set, AssetKind::VendorStyles)?;
            generator.register_vendor_pipeline(theme, manifest, set, AssetKind::VendorScripts)?;
        }

        for plugin_kind in &config.plugin_kinds {
            generator.register_plugin_style_pipeline(theme, plugin_kind)?;
        }

        has_copies |= generator.register_vendor_copy_tasks(theme, manifest)?;
    }

    generator.register_aggregates(has_copies)?;
    generator.register_roots()?;

    let registry = generator.finish();
    graph::validate(&registry)?;

    debug!("Generated {} tasks", registry.len());
    Ok(registry)
}

/// A registered leaf, remembered so aggregates list exactly their children
#[derive(Debug, Clone)]
struct Leaf {
    theme: String,
    kind: AssetKind,
    variant: Variant,
    watched: bool,
}

impl Leaf {
    fn key(&self, role: Role) -> TaskKey {
        TaskKey::leaf(&self.theme, self.kind, self.variant.clone(), role)
    }
}

pub struct Generator<'a> {
    config: &'a Config,
    registry: TaskRegistry,
    leaves: Vec<Leaf>,
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            registry: TaskRegistry::new(),
            leaves: Vec::new(),
        }
    }

    /// `clean.{theme}`: remove the theme's whole build directory
    pub fn register_clean_task(&mut self, theme: &Theme) -> Result<(), GraphError> {
        self.registry.register(TaskDef::action(
            TaskKey::output(&theme.name, Role::Clean),
            Action::Delete {
                targets: vec![globs::literal(&theme.paths.build)],
            },
        ))
    }

    /// Clean, build and watch leaves for the theme's own styles or scripts
    pub fn register_asset_pipeline(
        &mut self,
        theme: &Theme,
        set: &str,
        kind: AssetKind,
    ) -> Result<(), GraphError> {
        let paths = &theme.paths;

        let (action, outputs, watch) = match kind {
            AssetKind::Styles => {
                let dir = paths.styles.join(set);
                let output = paths.build.join(format!("{set}.css"));
                let map = paths.build.join(format!("{set}.css.map"));
                let action = Action::CompileStyles {
                    entries: vec![
                        dir.join(format!("{set}.scss")),
                        dir.join(format!("{set}.sass")),
                    ],
                    load_paths: self.load_paths(theme),
                    output: output.clone(),
                };
                let watch = vec![
                    globs::within(&dir, "**/*.scss"),
                    globs::within(&dir, "**/*.sass"),
                ];
                (action, vec![output, map], watch)
            }
            AssetKind::Scripts => {
                let dir = paths.scripts.join(set);
                let output = paths.build.join(format!("{set}.js"));
                let pattern = globs::within(&dir, "**/*.js");
                let action = Action::ConcatScripts {
                    patterns: vec![pattern.clone()],
                    output: output.clone(),
                    minify: self.config.production,
                };
                (action, vec![output], vec![pattern])
            }
            other => return Err(GraphError::WrongPipeline(other.segment())),
        };

        let leaf = Leaf {
            theme: theme.name.clone(),
            kind,
            variant: Variant::Set(set.to_string()),
            watched: true,
        };
        self.register_leaf(leaf.clone(), action, literals(&outputs))?;

        self.registry.register(TaskDef::action(
            leaf.key(Role::Watch),
            Action::Watch {
                patterns: watch,
                target: leaf.key(Role::Build),
            },
        ))
    }

    /// Clean and build leaves for a vendor bundle. An unusable glob turns the
    /// build leaf into a no-op; the clean leaf is always real.
    pub fn register_vendor_pipeline(
        &mut self,
        theme: &Theme,
        manifest: &VendorManifest,
        set: &str,
        kind: AssetKind,
    ) -> Result<(), GraphError> {
        let build = &theme.paths.build;
        let root = &self.config.root;

        let (check, output) = match kind {
            AssetKind::VendorStyles => (manifest.styles(set), build.join(format!("{set}-vendor.css"))),
            AssetKind::VendorScripts => (manifest.scripts(set), build.join(format!("{set}-vendor.js"))),
            other => return Err(GraphError::WrongPipeline(other.segment())),
        };

        let action = match check.anchored(root) {
            GlobCheck::Skip(reason) => {
                debug!("{}.{}.{}: {}", theme.name, kind.segment(), set, reason);
                Action::Noop { reason }
            }
            GlobCheck::Run(patterns) if kind == AssetKind::VendorStyles => Action::BundleStyles {
                patterns,
                output: output.clone(),
            },
            GlobCheck::Run(patterns) => Action::ConcatScripts {
                patterns,
                output: output.clone(),
                minify: self.config.production,
            },
        };

        let leaf = Leaf {
            theme: theme.name.clone(),
            kind,
            variant: Variant::Set(set.to_string()),
            watched: false,
        };
        self.register_leaf(leaf, action, literals(&[output]))
    }

    /// Plugin stylesheets compiled in place below the plugin directory
    pub fn register_plugin_style_pipeline(
        &mut self,
        theme: &Theme,
        plugin_kind: &str,
    ) -> Result<(), GraphError> {
        let plugins = &theme.paths.plugins;

        let action = Action::CompileInPlace {
            patterns: vec![
                globs::within(plugins, &format!("**/styles/{plugin_kind}.scss")),
                globs::within(plugins, &format!("**/styles/{plugin_kind}.sass")),
            ],
            load_paths: self.load_paths(theme),
        };
        let clean = vec![globs::within(plugins, &format!("**/styles/{plugin_kind}.css"))];

        let leaf = Leaf {
            theme: theme.name.clone(),
            kind: AssetKind::PluginStyles,
            variant: Variant::Plugin(plugin_kind.to_string()),
            watched: false,
        };
        self.register_leaf(leaf, action, clean)
    }

    /// One clean/build pair per copy entry. Returns whether the theme has any.
    pub fn register_vendor_copy_tasks(
        &mut self,
        theme: &Theme,
        manifest: &VendorManifest,
    ) -> Result<bool, GraphError> {
        let mut any = false;

        for (glob, dest) in manifest.copies() {
            let destination = under(&theme.paths.build, dest);

            let action = match GlobCheck::from_pattern(glob).anchored(&self.config.root) {
                GlobCheck::Skip(reason) => {
                    debug!("{}.vendor.copy {:?}: {}", theme.name, glob, reason);
                    Action::Noop { reason }
                }
                GlobCheck::Run(patterns) => Action::Copy {
                    patterns,
                    destination: destination.clone(),
                },
            };

            let leaf = Leaf {
                theme: theme.name.clone(),
                kind: AssetKind::VendorCopy,
                variant: Variant::Copy {
                    glob: glob.to_string(),
                    dest: dest.to_string(),
                },
                watched: false,
            };
            self.register_leaf(leaf, action, literals(&[destination]))?;
            any = true;
        }

        Ok(any)
    }

    /// Per-theme then per-kind `clean.X`, `watch.X` and `X` tasks
    pub fn register_aggregates(&mut self, has_copies: bool) -> Result<(), GraphError> {
        let config = self.config;

        for kind in AssetKind::ALL {
            if kind == AssetKind::VendorCopy && !has_copies {
                // Keep `vendor.copy` addressable so `default` never dangles
                self.registry.register(TaskDef::action(
                    TaskKey::kind(kind, Role::Build),
                    Action::Noop {
                        reason: "no vendor copy entries",
                    },
                ))?;
                continue;
            }

            for theme in &config.themes {
                let leaves: Vec<&Leaf> = self
                    .leaves
                    .iter()
                    .filter(|l| l.theme == theme.name && l.kind == kind)
                    .collect();

                let clean = leaves.iter().map(|l| l.key(Role::Clean)).collect();
                let build = leaves.iter().map(|l| l.key(Role::Build)).collect();
                let watch: Vec<_> = leaves
                    .iter()
                    .filter(|l| l.watched)
                    .map(|l| l.key(Role::Watch))
                    .collect();

                self.register_aggregate(TaskKey::theme(&theme.name, kind, Role::Build), clean, build)?;

                if kind == AssetKind::PluginStyles {
                    self.registry.register(plugin_watcher(theme))?;
                } else if kind.is_watched() {
                    self.registry.register(TaskDef::parallel(
                        TaskKey::theme(&theme.name, kind, Role::Watch),
                        watch,
                    ))?;
                }
            }

            let per_theme = |role| -> Vec<TaskKey> {
                config
                    .themes
                    .iter()
                    .map(|t| TaskKey::theme(&t.name, kind, role))
                    .collect()
            };

            self.register_aggregate(
                TaskKey::kind(kind, Role::Build),
                per_theme(Role::Clean),
                per_theme(Role::Build),
            )?;
            if kind.is_watched() {
                self.registry.register(TaskDef::parallel(
                    TaskKey::kind(kind, Role::Watch),
                    per_theme(Role::Watch),
                ))?;
            }
        }

        Ok(())
    }

    /// `clean`, `default` and `watch`
    pub fn register_roots(&mut self) -> Result<(), GraphError> {
        let clean = TaskKey::root(Role::Clean);
        let default = TaskKey::root(Role::Build);

        let themes = self
            .config
            .themes
            .iter()
            .map(|t| TaskKey::output(&t.name, Role::Clean))
            .collect();
        self.registry.register(TaskDef::parallel(clean.clone(), themes))?;

        let kinds = AssetKind::ALL
            .iter()
            .map(|&k| TaskKey::kind(k, Role::Build))
            .collect();
        self.registry
            .register(TaskDef::parallel(default.clone(), kinds).after(clean))?;

        let watchers = AssetKind::ALL
            .iter()
            .filter(|k| k.is_watched())
            .map(|&k| TaskKey::kind(k, Role::Watch))
            .collect();
        self.registry
            .register(TaskDef::parallel(TaskKey::root(Role::Watch), watchers).after(default))
    }

    pub fn finish(self) -> TaskRegistry {
        self.registry
    }

    /// Build leaf plus the clean leaf it runs first
    fn register_leaf(
        &mut self,
        leaf: Leaf,
        action: Action,
        clean_targets: Vec<String>,
    ) -> Result<(), GraphError> {
        let clean = Action::Delete {
            targets: clean_targets,
        };

        self.registry
            .register(TaskDef::action(leaf.key(Role::Clean), clean))?;
        self.registry
            .register(TaskDef::action(leaf.key(Role::Build), action).after(leaf.key(Role::Clean)))?;
        self.leaves.push(leaf);
        Ok(())
    }

    /// `clean.X` in parallel, and `X := series(clean.X, parallel(children))`
    fn register_aggregate(
        &mut self,
        key: TaskKey,
        clean: Vec<TaskKey>,
        build: Vec<TaskKey>,
    ) -> Result<(), GraphError> {
        let clean_key = key.with_role(Role::Clean);
        self.registry
            .register(TaskDef::parallel(clean_key.clone(), clean))?;
        self.registry
            .register(TaskDef::parallel(key, build).after(clean_key))
    }

    /// Sass load paths: node_modules, then the theme's styles directory
    fn load_paths(&self, theme: &Theme) -> Vec<PathBuf> {
        vec![self.config.node_modules.clone(), theme.paths.styles.clone()]
    }
}

/// Any plugin stylesheet change rebuilds all of the theme's plugin styles
fn plugin_watcher(theme: &Theme) -> TaskDef {
    let plugins = &theme.paths.plugins;

    TaskDef::action(
        TaskKey::theme(&theme.name, AssetKind::PluginStyles, Role::Watch),
        Action::Watch {
            patterns: vec![
                globs::within(plugins, "**/styles/*.scss"),
                globs::within(plugins, "**/styles/*.sass"),
            ],
            target: TaskKey::theme(&theme.name, AssetKind::PluginStyles, Role::Build),
        },
    )
}

fn literals(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| globs::literal(p)).collect()
}

/// `dest` resolved inside `build`: root and prefix components are dropped,
/// so `/fonts` lands at `build/fonts`.
fn under(build: &Path, dest: &str) -> PathBuf {
    let mut out = build.to_path_buf();
    for part in Path::new(dest).components() {
        match part {
            Component::Normal(_) | Component::ParentDir => out.push(part),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ThemePaths, ToolchainConfig};
    use crate::registry::Body;
    use serde_json::json;
    use std::path::Path;

    fn config(root: &Path, production: bool) -> Config {
        Config {
            root: root.to_path_buf(),
            themes: vec![Theme {
                name: "parent".into(),
                paths: ThemePaths::under(&root.join("theme")),
            }],
            build_sets: vec!["main".into(), "login".into(), "admin".into()],
            plugin_kinds: vec!["main".into(), "admin".into(), "editor".into()],
            node_modules: root.join("node_modules"),
            toolchain: ToolchainConfig::default(),
            production,
        }
    }

    fn manifests(value: serde_json::Value) -> Manifests {
        let manifest: VendorManifest = serde_json::from_value(value).unwrap();
        Manifests::from([("parent".to_string(), manifest)])
    }

    fn task<'r>(registry: &'r TaskRegistry, name: &str) -> &'r TaskDef {
        registry
            .resolve(name)
            .unwrap_or_else(|| panic!("task {name} not registered"))
    }

    fn children(registry: &TaskRegistry, name: &str) -> Vec<String> {
        match &task(registry, name).body {
            Body::Parallel(children) => children.iter().map(|k| k.to_string()).collect(),
            Body::Action(a) => panic!("{name} is a leaf: {a:?}"),
        }
    }

    fn deps(registry: &TaskRegistry, name: &str) -> Vec<String> {
        task(registry, name)
            .depends_on
            .iter()
            .map(|k| k.to_string())
            .collect()
    }

    #[test]
    fn test_every_build_leaf_runs_its_clean_first() {
        let root = Path::new("/site");
        let registry = build_graph(&config(root, false), &manifests(json!({}))).unwrap();

        for set in ["main", "login", "admin"] {
            for kind in ["styles", "scripts", "vendor.styles", "vendor.scripts"] {
                let build = format!("parent.{kind}.{set}");
                assert_eq!(deps(&registry, &build), vec![format!("clean.{build}")]);
                assert!(task(&registry, &format!("clean.{build}")).is_leaf());
            }
        }
        for plugin in ["main", "admin", "editor"] {
            let build = format!("parent.styles.plugins[{plugin}]");
            assert_eq!(deps(&registry, &build), vec![format!("clean.{build}")]);
        }
    }

    #[test]
    fn test_aggregates_list_exactly_their_children() {
        let registry = build_graph(&config(Path::new("/site"), false), &manifests(json!({}))).unwrap();

        assert_eq!(
            children(&registry, "parent.styles"),
            vec!["parent.styles.main", "parent.styles.login", "parent.styles.admin"]
        );
        assert_eq!(deps(&registry, "parent.styles"), vec!["clean.parent.styles"]);
        assert_eq!(
            children(&registry, "clean.parent.scripts"),
            vec![
                "clean.parent.scripts.main",
                "clean.parent.scripts.login",
                "clean.parent.scripts.admin"
            ]
        );
        assert_eq!(
            children(&registry, "watch.parent.styles"),
            vec![
                "watch.parent.styles.main",
                "watch.parent.styles.login",
                "watch.parent.styles.admin"
            ]
        );
        assert_eq!(
            children(&registry, "parent.styles.plugins"),
            vec![
                "parent.styles.plugins[main]",
                "parent.styles.plugins[admin]",
                "parent.styles.plugins[editor]"
            ]
        );
        assert_eq!(children(&registry, "vendor.scripts"), vec!["parent.vendor.scripts"]);
        assert_eq!(deps(&registry, "vendor.scripts"), vec!["clean.vendor.scripts"]);
        assert_eq!(children(&registry, "clean.styles"), vec!["clean.parent.styles"]);
        assert_eq!(children(&registry, "watch.scripts"), vec!["watch.parent.scripts"]);
    }

    #[test]
    fn test_vendor_entries_never_watched() {
        let registry = build_graph(&config(Path::new("/site"), false), &manifests(json!({}))).unwrap();

        assert!(registry.resolve("watch.vendor.styles").is_none());
        assert!(registry.resolve("watch.parent.vendor.scripts").is_none());
        assert!(registry.resolve("watch.parent.vendor.styles.main").is_none());
    }

    #[test]
    fn test_roots() {
        let registry = build_graph(&config(Path::new("/site"), false), &manifests(json!({}))).unwrap();

        assert_eq!(children(&registry, "clean"), vec!["clean.parent"]);
        assert_eq!(deps(&registry, "default"), vec!["clean"]);
        assert_eq!(
            children(&registry, "default"),
            vec![
                "styles",
                "styles.plugins",
                "scripts",
                "vendor.styles",
                "vendor.scripts",
                "vendor.copy"
            ]
        );
        assert_eq!(deps(&registry, "watch"), vec!["default"]);
        assert_eq!(
            children(&registry, "watch"),
            vec!["watch.styles", "watch.styles.plugins", "watch.scripts"]
        );
    }

    #[test]
    fn test_invalid_vendor_glob_becomes_noop() {
        let root = Path::new("/site");
        let registry = build_graph(
            &config(root, false),
            &manifests(json!({"styles": {"main": "vendor/*.css", "login": "", "admin": ["a/***"]}})),
        )
        .unwrap();

        let main = task(&registry, "parent.vendor.styles.main");
        assert_eq!(
            main.body,
            Body::Action(Action::BundleStyles {
                patterns: vec!["/site/vendor/*.css".into()],
                output: root.join("theme/_/main-vendor.css"),
            })
        );

        for set in ["login", "admin"] {
            let build = task(&registry, &format!("parent.vendor.styles.{set}"));
            assert!(matches!(build.body, Body::Action(Action::Noop { .. })));
            let clean = task(&registry, &format!("clean.parent.vendor.styles.{set}"));
            assert!(matches!(clean.body, Body::Action(Action::Delete { .. })));
        }
    }

    #[test]
    fn test_no_copy_entries_registers_single_noop() {
        let registry = build_graph(&config(Path::new("/site"), false), &manifests(json!({}))).unwrap();

        let copy = task(&registry, "vendor.copy");
        assert!(matches!(copy.body, Body::Action(Action::Noop { .. })));
        assert!(copy.depends_on.is_empty());
        assert!(registry.resolve("clean.vendor.copy").is_none());
        assert!(registry.resolve("parent.vendor.copy").is_none());
    }

    #[test]
    fn test_copy_entries() {
        let root = Path::new("/site");
        let registry = build_graph(
            &config(root, false),
            &manifests(json!({"copy": {"node_modules/icons/fonts/*": "fonts", "": "nothing"}})),
        )
        .unwrap();

        let names = children(&registry, "parent.vendor.copy");
        assert_eq!(
            names,
            vec![
                "parent.vendor.copy {\"\": \"nothing\"}",
                "parent.vendor.copy {\"node_modules/icons/fonts/*\": \"fonts\"}"
            ]
        );

        let build = task(&registry, &names[1]);
        assert_eq!(
            build.body,
            Body::Action(Action::Copy {
                patterns: vec!["/site/node_modules/icons/fonts/*".into()],
                destination: root.join("theme/_/fonts"),
            })
        );
        assert_eq!(deps(&registry, &names[1]), vec![format!("clean.{}", names[1])]);
        assert!(matches!(task(&registry, &names[0]).body, Body::Action(Action::Noop { .. })));

        assert_eq!(deps(&registry, "vendor.copy"), vec!["clean.vendor.copy"]);
        assert_eq!(children(&registry, "clean.vendor.copy"), vec!["clean.parent.vendor.copy"]);
    }

    #[test]
    fn test_absolute_copy_destination_stays_in_build_dir() {
        let root = Path::new("/site");
        let registry = build_graph(
            &config(root, false),
            &manifests(json!({"copy": {"fonts/*": "/fonts"}})),
        )
        .unwrap();

        let name = "parent.vendor.copy {\"fonts/*\": \"/fonts\"}";
        assert_eq!(
            task(&registry, &format!("clean.{name}")).body,
            Body::Action(Action::Delete {
                targets: vec![globs::literal(&root.join("theme/_/fonts"))],
            })
        );
        assert_eq!(
            task(&registry, name).body,
            Body::Action(Action::Copy {
                patterns: vec!["/site/fonts/*".into()],
                destination: root.join("theme/_/fonts"),
            })
        );
        assert_eq!(under(Path::new("/b"), "./a/../c"), PathBuf::from("/b/a/../c"));
    }

    #[test]
    fn test_two_themes_one_with_copies() {
        let root = Path::new("/site");
        let mut config = config(root, false);
        config.themes = ["parent", "child"]
            .into_iter()
            .map(|name| Theme {
                name: name.into(),
                paths: ThemePaths::under(&root.join(name)),
            })
            .collect();

        let manifest = |value| serde_json::from_value::<VendorManifest>(value).unwrap();
        let manifests = Manifests::from([
            ("parent".to_string(), manifest(json!({"copy": {"fonts/*": "fonts"}}))),
            ("child".to_string(), manifest(json!({}))),
        ]);
        let registry = build_graph(&config, &manifests).unwrap();

        assert_eq!(children(&registry, "styles"), vec!["parent.styles", "child.styles"]);
        assert_eq!(
            children(&registry, "clean.styles"),
            vec!["clean.parent.styles", "clean.child.styles"]
        );
        assert_eq!(
            children(&registry, "watch.scripts"),
            vec!["watch.parent.scripts", "watch.child.scripts"]
        );
        assert_eq!(children(&registry, "clean"), vec!["clean.parent", "clean.child"]);

        assert_eq!(
            children(&registry, "vendor.copy"),
            vec!["parent.vendor.copy", "child.vendor.copy"]
        );
        assert_eq!(
            children(&registry, "parent.vendor.copy"),
            vec!["parent.vendor.copy {\"fonts/*\": \"fonts\"}"]
        );
        assert!(children(&registry, "child.vendor.copy").is_empty());
        assert!(children(&registry, "clean.child.vendor.copy").is_empty());

        let Body::Action(Action::Copy { destination, .. }) =
            &task(&registry, "parent.vendor.copy {\"fonts/*\": \"fonts\"}").body
        else {
            panic!("expected a copy");
        };
        assert_eq!(destination, &root.join("parent/_/fonts"));
    }

    #[test]
    fn test_watch_leaves_target_their_build_leaf() {
        let root = Path::new("/site");
        let registry = build_graph(&config(root, false), &manifests(json!({}))).unwrap();

        let watch = task(&registry, "watch.parent.styles.main");
        let Body::Action(Action::Watch { patterns, target }) = &watch.body else {
            panic!("expected a watcher");
        };
        assert_eq!(target.to_string(), "parent.styles.main");
        assert_eq!(
            patterns,
            &vec![
                "/site/theme/styles/main/**/*.scss".to_string(),
                "/site/theme/styles/main/**/*.sass".to_string()
            ]
        );

        let plugins = task(&registry, "watch.parent.styles.plugins");
        let Body::Action(Action::Watch { target, .. }) = &plugins.body else {
            panic!("expected a watcher");
        };
        assert_eq!(target.to_string(), "parent.styles.plugins");
    }

    #[test]
    fn test_production_flag_enables_minify() {
        let root = Path::new("/site");
        for production in [false, true] {
            let registry = build_graph(
                &config(root, production),
                &manifests(json!({"scripts": {"main": "vendor/*.js"}})),
            )
            .unwrap();

            for name in ["parent.scripts.main", "parent.vendor.scripts.main"] {
                let Body::Action(Action::ConcatScripts { minify, .. }) = &task(&registry, name).body
                else {
                    panic!("{name} should concatenate scripts");
                };
                assert_eq!(*minify, production);
            }
        }
    }

    #[test]
    fn test_missing_manifest() {
        let err = build_graph(&config(Path::new("/site"), false), &Manifests::new()).unwrap_err();
        assert!(matches!(err, GraphError::MissingManifest(theme) if theme == "parent"));
    }

    #[test]
    fn test_wrong_pipeline_rejected() {
        let config = config(Path::new("/site"), false);
        let mut generator = Generator::new(&config);
        let err = generator
            .register_asset_pipeline(&config.themes[0], "main", AssetKind::VendorCopy)
            .unwrap_err();
        assert!(matches!(err, GraphError::WrongPipeline("vendor.copy")));
    }
}
