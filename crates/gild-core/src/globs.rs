//! Glob helpers: validation, anchoring to a directory and expansion
//!
//! Configured patterns follow the gitignore dialect of the `ignore` crate:
//! brace sets (`*.{css,scss}`) expand, and entries starting with `!` exclude
//! what the other entries of the same list match.

use anyhow::Result;
use glob::{MatchOptions, Pattern};
use ignore::overrides::{Override, OverrideBuilder};
use ignore::WalkBuilder;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// Options used for matching watch events
pub const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Prefix marking an exclusion entry
const EXCLUDE: char = '!';

/// Outcome of validating a configured glob.
///
/// `Skip` turns the owning task into a no-op instead of an error, so a broken
/// vendor entry never blocks the rest of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobCheck {
    Skip(&'static str),
    Run(Vec<String>),
}

impl GlobCheck {
    /// Accepts a non-empty string or a non-empty array of non-empty strings
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => GlobCheck::Skip("no pattern configured"),
            Some(Value::String(pattern)) => Self::from_patterns(std::slice::from_ref(pattern)),
            Some(Value::Array(items)) => {
                let patterns: Option<Vec<String>> = items
                    .iter()
                    .map(|v| v.as_str().map(String::from))
                    .collect();
                match patterns {
                    Some(patterns) => Self::from_patterns(&patterns),
                    None => GlobCheck::Skip("pattern list contains a non-string"),
                }
            }
            Some(_) => GlobCheck::Skip("pattern is not a string or list"),
        }
    }

    pub fn from_pattern(pattern: &str) -> Self {
        Self::from_patterns(&[pattern.to_string()])
    }

    fn from_patterns(patterns: &[String]) -> Self {
        if patterns.is_empty() {
            return GlobCheck::Skip("empty pattern list");
        }
        if patterns.iter().any(|p| p.is_empty() || p == "!") {
            return GlobCheck::Skip("empty pattern");
        }
        if patterns.iter().all(|p| p.starts_with(EXCLUDE)) {
            return GlobCheck::Skip("only exclusions");
        }
        if patterns.iter().any(|p| !is_valid(p)) {
            return GlobCheck::Skip("malformed pattern");
        }
        GlobCheck::Run(patterns.to_vec())
    }

    /// Make relative patterns absolute below `root`
    pub fn anchored(self, root: &Path) -> Self {
        match self {
            GlobCheck::Run(patterns) => {
                GlobCheck::Run(patterns.iter().map(|p| anchor(root, p)).collect())
            }
            skip => skip,
        }
    }
}

fn is_valid(pattern: &str) -> bool {
    let positive = pattern.trim_start_matches(EXCLUDE);
    Pattern::new(positive).is_ok() && OverrideBuilder::new("/").add(pattern).is_ok()
}

/// Join a relative glob onto `root`, escaping the root itself.
/// An exclusion stays an exclusion.
pub fn anchor(root: &Path, pattern: &str) -> String {
    if let Some(excluded) = pattern.strip_prefix(EXCLUDE) {
        return format!("{EXCLUDE}{}", anchor(root, excluded));
    }
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    within(root, pattern)
}

/// `{dir}/{tail}` with `dir` escaped so it only ever matches literally
pub fn within(dir: &Path, tail: &str) -> String {
    let dir = escape(&dir.to_string_lossy());
    format!("{}/{}", dir.trim_end_matches('/'), tail)
}

/// Pattern matching exactly one path
pub fn literal(path: &Path) -> String {
    escape(&path.to_string_lossy())
}

/// Escape every character either dialect treats specially
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '*' | '?' | '[' | ']' | '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            c => out.push(c),
        }
    }
    out
}

/// Leading directories of a pattern that contain no wildcard.
/// Escaped characters (`[*]`) count as literal.
pub fn literal_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let path = Path::new(pattern.trim_start_matches(EXCLUDE));
    let components: Vec<_> = path.components().collect();

    for (i, component) in components.iter().enumerate() {
        // The final component names files, never part of the base
        if i + 1 == components.len() {
            break;
        }
        match component {
            Component::Normal(part) => match unescape(&part.to_string_lossy()) {
                Some(literal) => base.push(literal),
                None => break,
            },
            other => base.push(other.as_os_str()),
        }
    }

    base
}

/// The path a pattern names when it has no wildcard at all
fn literal_path(pattern: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(pattern).components() {
        match component {
            Component::Normal(part) => path.push(unescape(&part.to_string_lossy())?),
            other => path.push(other.as_os_str()),
        }
    }
    Some(path)
}

/// Returns the literal text of a component, or `None` if it has wildcards
fn unescape(part: &str) -> Option<String> {
    let chars: Vec<char> = part.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '[' if i + 2 < chars.len() && chars[i + 2] == ']' => {
                out.push(chars[i + 1]);
                i += 3;
            }
            '*' | '?' | '[' | '{' | '}' => return None,
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Some(out)
}

/// Expand patterns into sorted, de-duplicated paths
pub fn expand(patterns: &[String]) -> Result<Vec<PathBuf>> {
    Ok(expand_with_base(patterns)?
        .into_iter()
        .map(|(path, _)| path)
        .collect())
}

/// Like [`expand`] but keeps the base directory of the pattern each file came from.
///
/// `!` entries remove matches of every other entry in the list.
pub fn expand_with_base(patterns: &[String]) -> Result<Vec<(PathBuf, PathBuf)>> {
    let (includes, excludes): (Vec<&String>, Vec<&String>) =
        patterns.iter().partition(|p| !p.starts_with(EXCLUDE));

    let exclusions = matcher(None, &excludes)?;

    let mut files = Vec::new();
    for include in includes {
        if let Some(path) = literal_path(include) {
            if path.symlink_metadata().is_ok() && !exclusions.matched(&path, path.is_dir()).is_ignore() {
                let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
                files.push((path, base));
            }
            continue;
        }

        let base = literal_base(include);
        if !base.is_dir() {
            continue;
        }

        let filter = matcher(Some(include.as_str()), &excludes)?;
        let walker = WalkBuilder::new(&base)
            .standard_filters(false)
            .overrides(filter.clone())
            .build();

        for entry in walker {
            let entry = entry?;
            if entry.depth() == 0 {
                continue;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if filter.matched(entry.path(), is_dir).is_whitelist() {
                files.push((entry.into_path(), base.clone()));
            }
        }
    }

    files.sort();
    files.dedup_by(|a, b| a.0 == b.0);
    Ok(files)
}

/// Matcher over absolute paths: the include (if any) plus every exclusion
fn matcher(include: Option<&str>, excludes: &[&String]) -> Result<Override> {
    let mut builder = OverrideBuilder::new("/");
    if let Some(include) = include {
        builder.add(include)?;
    }
    for exclude in excludes {
        builder.add(exclude)?;
    }
    Ok(builder.build()?)
}

/// Express `path` relative to the directory `base`
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path: Vec<_> = path.components().collect();
    let base: Vec<_> = base.components().collect();
    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for component in &path[common..] {
        out.push(component.as_os_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_glob_check() {
        assert_eq!(
            GlobCheck::from_value(Some(&json!("vendor/*.css"))),
            GlobCheck::Run(vec!["vendor/*.css".into()])
        );
        assert_eq!(
            GlobCheck::from_value(Some(&json!(["a/*.js", "b/*.js"]))),
            GlobCheck::Run(vec!["a/*.js".into(), "b/*.js".into()])
        );
        assert!(matches!(GlobCheck::from_value(None), GlobCheck::Skip(_)));
        assert!(matches!(GlobCheck::from_value(Some(&json!(""))), GlobCheck::Skip(_)));
        assert!(matches!(GlobCheck::from_value(Some(&json!([]))), GlobCheck::Skip(_)));
        assert!(matches!(GlobCheck::from_value(Some(&json!(["a", ""]))), GlobCheck::Skip(_)));
        assert!(matches!(GlobCheck::from_value(Some(&json!([1]))), GlobCheck::Skip(_)));
        assert!(matches!(GlobCheck::from_value(Some(&json!(false))), GlobCheck::Skip(_)));
        assert!(matches!(GlobCheck::from_pattern("a/***/b"), GlobCheck::Skip(_)));
        assert!(matches!(GlobCheck::from_pattern("a/{x.css"), GlobCheck::Skip(_)));
        assert!(matches!(GlobCheck::from_value(Some(&json!(["!a/*.css"]))), GlobCheck::Skip(_)));
        assert!(matches!(GlobCheck::from_value(Some(&json!(["a/*", "!"]))), GlobCheck::Skip(_)));
        assert_eq!(
            GlobCheck::from_value(Some(&json!(["a/*.{css,scss}", "!a/skip.css"]))),
            GlobCheck::Run(vec!["a/*.{css,scss}".into(), "!a/skip.css".into()])
        );
    }

    #[test]
    fn test_anchor() {
        let root = Path::new("/srv/site");
        assert_eq!(anchor(root, "./vendor/*.css"), "/srv/site/vendor/*.css");
        assert_eq!(anchor(root, "/abs/*.css"), "/abs/*.css");
        assert_eq!(anchor(Path::new("/srv/[x]"), "a/*"), "/srv/[[]x[]]/a/*");
        assert_eq!(anchor(Path::new("/srv/{x}"), "a/*"), "/srv/[{]x[}]/a/*");
        assert_eq!(anchor(root, "!vendor/skip.css"), "!/srv/site/vendor/skip.css");
    }

    #[test]
    fn test_literal_base() {
        assert_eq!(
            literal_base("/srv/node_modules/pkg/dist/**/*.woff"),
            PathBuf::from("/srv/node_modules/pkg/dist")
        );
        assert_eq!(literal_base("/srv/fonts/*.woff"), PathBuf::from("/srv/fonts"));
        assert_eq!(literal_base("/srv/[[]x[]]/a/*"), PathBuf::from("/srv/[x]/a"));
        assert_eq!(literal_base("/srv/a/file.txt"), PathBuf::from("/srv/a"));
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/t/styles/main/main.scss"), Path::new("/t/_")),
            PathBuf::from("../styles/main/main.scss")
        );
        assert_eq!(
            relative_to(Path::new("/t/_/a.css"), Path::new("/t/_")),
            PathBuf::from("a.css")
        );
    }

    #[test]
    fn test_expand_sorted() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("js/nested")).unwrap();
        std::fs::write(dir.path().join("js/b.js"), "b").unwrap();
        std::fs::write(dir.path().join("js/a.js"), "a").unwrap();
        std::fs::write(dir.path().join("js/nested/c.js"), "c").unwrap();
        std::fs::write(dir.path().join("js/skip.txt"), "x").unwrap();

        let files = expand(&[within(&dir.path().join("js"), "**/*.js")]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| relative_to(p, dir.path()))
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from("js/a.js"),
                PathBuf::from("js/b.js"),
                PathBuf::from("js/nested/c.js"),
            ]
        );
    }

    fn vendor_dir() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        let vendor = dir.path().join("vendor");
        std::fs::create_dir_all(vendor.join("nested")).unwrap();
        for name in ["a.css", "b.scss", "skip.css", "c.js", "nested/d.css"] {
            std::fs::write(vendor.join(name), name).unwrap();
        }
        dir
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<PathBuf> {
        files.iter().map(|p| relative_to(p, root)).collect()
    }

    #[test]
    fn test_expand_brace_set() {
        let dir = vendor_dir();
        let files = expand(&[anchor(dir.path(), "vendor/*.{css,scss}")]).unwrap();

        assert_eq!(
            names(&files, dir.path()),
            vec![
                PathBuf::from("vendor/a.css"),
                PathBuf::from("vendor/b.scss"),
                PathBuf::from("vendor/skip.css"),
            ]
        );
    }

    #[test]
    fn test_expand_exclusions() {
        let dir = vendor_dir();
        let patterns = vec![
            anchor(dir.path(), "vendor/**/*.css"),
            anchor(dir.path(), "!vendor/skip.css"),
        ];

        assert_eq!(
            names(&expand(&patterns).unwrap(), dir.path()),
            vec![PathBuf::from("vendor/a.css"), PathBuf::from("vendor/nested/d.css")]
        );

        // Exclusions also apply to literal entries
        let patterns = vec![
            literal(&dir.path().join("vendor/skip.css")),
            literal(&dir.path().join("vendor/a.css")),
            anchor(dir.path(), "!vendor/skip.css"),
        ];
        assert_eq!(
            names(&expand(&patterns).unwrap(), dir.path()),
            vec![PathBuf::from("vendor/a.css")]
        );
    }

    #[test]
    fn test_expand_literal_directory_and_missing_base() {
        let dir = vendor_dir();
        let files = expand(&[
            literal(&dir.path().join("vendor/nested")),
            anchor(dir.path(), "missing/**/*.css"),
        ])
        .unwrap();

        assert_eq!(files, vec![dir.path().join("vendor/nested")]);
    }
}
