//! Lexical path helpers for the tracked working directory.
//!
//! Nothing here touches the filesystem: targets are resolved purely by
//! joining and normalizing components, so nonexistent directories resolve
//! just like existing ones.

use std::path::{Component, Path, PathBuf};

/// Resolve `target` against `base`, collapsing `.` and `..` components.
///
/// An absolute `target` replaces `base`. An empty `target` resolves to `base`.
pub fn resolve(base: &Path, target: &str) -> PathBuf {
    normalize(&base.join(target))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root.
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Target of a directory-change command, or `None` when `command` is not one.
///
/// Only a plain `cd <path>` qualifies: `cdk deploy` is not a directory change,
/// and anything chained with shell operators is left to the shell. A bare `cd`
/// yields an empty target, which resolves to the current directory.
pub fn cd_target(command: &str) -> Option<&str> {
    let rest = command.trim().strip_prefix("cd")?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let target = rest.trim();
    if target.contains(['&', ';', '|', '\n', '`', '$']) {
        return None;
    }
    Some(strip_quotes(target))
}

fn strip_quotes(target: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = target
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_targets_against_base() {
        let base = Path::new("/work/project");
        assert_eq!(resolve(base, "src"), PathBuf::from("/work/project/src"));
        assert_eq!(resolve(base, "./src/../docs"), PathBuf::from("/work/project/docs"));
        assert_eq!(resolve(base, ".."), PathBuf::from("/work"));
        assert_eq!(resolve(base, ""), PathBuf::from("/work/project"));
    }

    #[test]
    fn absolute_target_replaces_base() {
        assert_eq!(
            resolve(Path::new("/work/project"), "/tmp/x/"),
            PathBuf::from("/tmp/x")
        );
    }

    #[test]
    fn parent_of_root_is_root() {
        assert_eq!(resolve(Path::new("/"), "../../etc"), PathBuf::from("/etc"));
    }

    #[test]
    fn nonexistent_targets_resolve_without_checks() {
        let base = Path::new("/definitely/not/here");
        assert_eq!(
            resolve(base, "missing/child"),
            PathBuf::from("/definitely/not/here/missing/child")
        );
    }

    #[test]
    fn detects_directory_changes() {
        assert_eq!(cd_target("cd myfile"), Some("myfile"));
        assert_eq!(cd_target("  cd   ../up  "), Some("../up"));
        assert_eq!(cd_target("cd \"my dir\""), Some("my dir"));
        assert_eq!(cd_target("cd"), Some(""));
    }

    #[test]
    fn other_commands_are_not_directory_changes() {
        assert_eq!(cd_target("ls -la"), None);
        assert_eq!(cd_target("cdk deploy"), None);
        assert_eq!(cd_target("cd app && npm install"), None);
        assert_eq!(cd_target("cd $HOME"), None);
        assert_eq!(cd_target("echo cd foo"), None);
    }
}
