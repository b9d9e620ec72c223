use anyhow::{Context, Result};
use declarative::{FileAttrs, FileService, PathInfo, PathKind, content_digest};
use nix::unistd::{Gid, Group, Uid, User, chown};
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

use super::SystemHost;

pub(super) fn path_info(path: &Path) -> Result<Option<PathInfo>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Could not stat {}", path.display())),
    };

    let kind = if metadata.is_dir() {
        PathKind::Directory
    } else if metadata.is_file() {
        PathKind::File
    } else {
        PathKind::Other
    };

    Ok(Some(PathInfo {
        kind,
        attrs: FileAttrs {
            owner: user_name(metadata.uid()),
            group: group_name(metadata.gid()),
            mode: metadata.mode() & 0o7777,
        },
    }))
}

pub(super) fn file_digest(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content =
        fs::read(path).with_context(|| format!("Could not read {}", path.display()))?;
    Ok(Some(content_digest(&content)))
}

/// Owner name, or the numeric uid when it has no passwd entry
fn user_name(uid: u32) -> String {
    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => user.name,
        _ => uid.to_string(),
    }
}

fn group_name(gid: u32) -> String {
    match Group::from_gid(Gid::from_raw(gid)) {
        Ok(Some(group)) => group.name,
        _ => gid.to_string(),
    }
}

fn resolve_uid(owner: &str) -> Result<Uid> {
    if let Ok(raw) = owner.parse() {
        return Ok(Uid::from_raw(raw));
    }
    User::from_name(owner)
        .with_context(|| format!("Could not look up user {owner}"))?
        .map(|user| user.uid)
        .with_context(|| format!("No such user: {owner}"))
}

fn resolve_gid(group: &str) -> Result<Gid> {
    if let Ok(raw) = group.parse() {
        return Ok(Gid::from_raw(raw));
    }
    Group::from_name(group)
        .with_context(|| format!("Could not look up group {group}"))?
        .map(|group| group.gid)
        .with_context(|| format!("No such group: {group}"))
}

/// Set owner, group and mode of an existing path
pub(super) fn apply_attrs(path: &Path, attrs: &FileAttrs) -> Result<()> {
    let uid = resolve_uid(&attrs.owner)?;
    let gid = resolve_gid(&attrs.group)?;
    chown(path, Some(uid), Some(gid))
        .with_context(|| format!("Could not chown {} to {}:{}", path.display(), attrs.owner, attrs.group))?;
    fs::set_permissions(path, fs::Permissions::from_mode(attrs.mode))
        .with_context(|| format!("Could not chmod {} to {:o}", path.display(), attrs.mode))
}

impl FileService for SystemHost {
    fn create_directory(&self, path: &Path, attrs: &FileAttrs, recursive: bool) -> Result<()> {
        log::debug!("mkdir {} ({attrs})", path.display());
        let created = if recursive {
            fs::create_dir_all(path)
        } else {
            fs::create_dir(path)
        };
        created.with_context(|| format!("Could not create directory {}", path.display()))?;
        apply_attrs(path, attrs)
    }

    fn set_attributes(&self, path: &Path, attrs: &FileAttrs) -> Result<()> {
        log::debug!("set {} to {attrs}", path.display());
        apply_attrs(path, attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_has_no_info() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(path_info(&missing).unwrap(), None);
        assert_eq!(file_digest(&missing).unwrap(), None);
    }

    #[test]
    fn test_path_info_reports_kind_and_mode() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("supervisord.conf");
        fs::write(&file, "[supervisord]\n").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o640)).unwrap();

        let info = path_info(&file).unwrap().unwrap();
        assert_eq!(info.kind, PathKind::File);
        assert_eq!(info.attrs.mode, 0o640);

        let info = path_info(dir.path()).unwrap().unwrap();
        assert_eq!(info.kind, PathKind::Directory);
    }

    #[test]
    fn test_digest_matches_content_digest() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a");
        fs::write(&file, "port=9001\n").unwrap();
        assert_eq!(
            file_digest(&file).unwrap(),
            Some(content_digest(b"port=9001\n"))
        );
        // directories have no content digest
        assert_eq!(file_digest(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_numeric_owner_resolves_without_lookup() {
        assert_eq!(resolve_uid("0").unwrap(), Uid::from_raw(0));
        assert_eq!(resolve_gid("0").unwrap(), Gid::from_raw(0));
        assert!(resolve_uid("no-such-user-for-supervise").is_err());
    }
}
