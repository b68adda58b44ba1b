//! Structured task identity.
//!
//! Tasks are identified by [`TaskKey`]; dotted names such as
//! `clean.parent.styles.main` are rendered from the key for display and CLI
//! addressing only.

use std::fmt;

/// What a task does to its scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Build,
    Clean,
    Watch,
}

impl Role {
    fn prefix(self) -> &'static str {
        match self {
            Role::Build => "",
            Role::Clean => "clean.",
            Role::Watch => "watch.",
        }
    }
}

/// Asset pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    Styles,
    PluginStyles,
    Scripts,
    VendorStyles,
    VendorScripts,
    VendorCopy,
}

impl AssetKind {
    /// Order used for the `default` root
    pub const ALL: [AssetKind; 6] = [
        AssetKind::Styles,
        AssetKind::PluginStyles,
        AssetKind::Scripts,
        AssetKind::VendorStyles,
        AssetKind::VendorScripts,
        AssetKind::VendorCopy,
    ];

    pub fn segment(self) -> &'static str {
        match self {
            AssetKind::Styles => "styles",
            AssetKind::PluginStyles => "styles.plugins",
            AssetKind::Scripts => "scripts",
            AssetKind::VendorStyles => "vendor.styles",
            AssetKind::VendorScripts => "vendor.scripts",
            AssetKind::VendorCopy => "vendor.copy",
        }
    }

    /// Vendor assets are never watched
    pub fn is_watched(self) -> bool {
        matches!(
            self,
            AssetKind::Styles | AssetKind::PluginStyles | AssetKind::Scripts
        )
    }
}

/// What distinguishes leaves of the same theme and kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variant {
    /// A build set such as `main`
    Set(String),
    /// A plugin stylesheet kind such as `editor`
    Plugin(String),
    /// One entry of the vendor copy table
    Copy { glob: String, dest: String },
}

/// Level of the hierarchy a task lives on
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// `default`, `clean`, `watch`
    Root,
    /// Whole build output of one theme
    Output(String),
    /// One kind across all themes
    Kind(AssetKind),
    /// One kind within one theme
    Theme(String, AssetKind),
    Leaf(String, AssetKind, Variant),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey {
    pub scope: Scope,
    pub role: Role,
}

impl TaskKey {
    pub fn new(scope: Scope, role: Role) -> Self {
        Self { scope, role }
    }

    pub fn root(role: Role) -> Self {
        Self::new(Scope::Root, role)
    }

    pub fn output(theme: &str, role: Role) -> Self {
        Self::new(Scope::Output(theme.to_string()), role)
    }

    pub fn kind(kind: AssetKind, role: Role) -> Self {
        Self::new(Scope::Kind(kind), role)
    }

    pub fn theme(theme: &str, kind: AssetKind, role: Role) -> Self {
        Self::new(Scope::Theme(theme.to_string(), kind), role)
    }

    pub fn leaf(theme: &str, kind: AssetKind, variant: Variant, role: Role) -> Self {
        Self::new(Scope::Leaf(theme.to_string(), kind, variant), role)
    }

    /// Same scope, different role
    pub fn with_role(&self, role: Role) -> Self {
        Self::new(self.scope.clone(), role)
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.role.prefix();
        match &self.scope {
            Scope::Root => f.write_str(match self.role {
                Role::Build => "default",
                Role::Clean => "clean",
                Role::Watch => "watch",
            }),
            Scope::Output(theme) => write!(f, "{prefix}{theme}"),
            Scope::Kind(kind) => write!(f, "{prefix}{}", kind.segment()),
            Scope::Theme(theme, kind) => write!(f, "{prefix}{theme}.{}", kind.segment()),
            Scope::Leaf(theme, kind, variant) => match variant {
                Variant::Set(set) => write!(f, "{prefix}{theme}.{}.{set}", kind.segment()),
                Variant::Plugin(name) => {
                    write!(f, "{prefix}{theme}.{}[{name}]", kind.segment())
                }
                Variant::Copy { glob, dest } => {
                    write!(f, "{prefix}{theme}.{} {{\"{glob}\": \"{dest}\"}}", kind.segment())
                }
            },
        }
    }
}
