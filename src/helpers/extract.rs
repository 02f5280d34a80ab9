//! Native archive extraction for build artifacts (tar.gz and zip).
//!
//! Entries that would land outside the destination are rejected, including
//! link-based escapes.

use crate::core::error::{BisectError, Result};
use crate::core::output;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use super::progress::{self, ProgressGuard};

/// Archive formats the update service and the alternate channel publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Detect format from filename extension.
    pub fn detect(archive: &Path) -> Option<Self> {
        let name = archive.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

fn extract_err(archive: &Path, reason: impl Into<String>) -> BisectError {
    BisectError::Extract {
        archive: archive.to_path_buf(),
        reason: reason.into(),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    // No filesystem access; used to validate link targets without
    // following symlinks.
    let mut out = PathBuf::new();
    let mut has_root = false;

    for c in path.components() {
        match c {
            Component::Prefix(p) => {
                out.clear();
                out.push(p.as_os_str());
                has_root = true;
            }
            Component::RootDir => {
                out.push(Component::RootDir.as_os_str());
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = out
                    .components()
                    .next_back()
                    .is_some_and(|last| matches!(last, Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !has_root {
                    out.push("..");
                }
            }
            Component::Normal(seg) => out.push(seg),
        }
    }

    out
}

fn ensure_no_symlink_components(dest: &Path, full_path: &Path) -> std::result::Result<(), String> {
    let rel = full_path
        .strip_prefix(dest)
        .map_err(|_| format!("entry outside destination: {}", full_path.display()))?;

    let mut cur = dest.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        if let Ok(md) = std::fs::symlink_metadata(&cur)
            && md.file_type().is_symlink()
        {
            return Err(format!(
                "extraction blocked: symlink in path component: {}",
                cur.display()
            ));
        }
    }

    Ok(())
}

fn ensure_link_target_within_dest(
    dest: &Path,
    link_parent: &Path,
    link_name: &Path,
) -> std::result::Result<(), String> {
    if link_name.is_absolute()
        || link_name
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(format!(
            "unsafe link target (absolute): {}",
            link_name.display()
        ));
    }

    let candidate = normalize_lexical(&link_parent.join(link_name));
    if candidate.strip_prefix(normalize_lexical(dest)).is_err() {
        return Err(format!(
            "unsafe link target (escapes dest): {} -> {}",
            link_parent.display(),
            link_name.display()
        ));
    }

    Ok(())
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> std::result::Result<(), String> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);

    for entry in archive.entries().map_err(|e| format!("tar read error: {}", e))? {
        let mut entry = entry.map_err(|e| format!("tar entry error: {}", e))?;

        let path = entry
            .path()
            .map_err(|e| format!("tar path error: {}", e))?
            .into_owned();

        if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
            return Err(format!("unsafe path: {}", path.display()));
        }

        if path.as_os_str().is_empty() || path == Path::new(".") {
            continue;
        }

        let full_path = dest.join(&path);
        ensure_no_symlink_components(dest, &full_path)?;

        let entry_type = entry.header().entry_type();
        if entry_type == tar::EntryType::Symlink || entry_type == tar::EntryType::Link {
            let link_name = entry
                .link_name()
                .map_err(|e| format!("tar link_name error: {}", e))?
                .ok_or_else(|| format!("link without target: {}", path.display()))?;
            let link_parent = full_path.parent().unwrap_or(dest);
            ensure_link_target_within_dest(dest, link_parent, &link_name)?;
        }

        if let Some(parent) = full_path.parent() {
            if parent.starts_with(dest) {
                ensure_no_symlink_components(dest, parent)?;
            }
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create directory {}: {}", parent.display(), e))?;
        }

        entry
            .unpack(&full_path)
            .map_err(|e| format!("unpack error for {}: {}", path.display(), e))?;
    }

    Ok(())
}

fn extract_tar_gz(archive_path: &Path, dest: &Path) -> std::result::Result<(), String> {
    let file = File::open(archive_path).map_err(|e| format!("cannot open: {}", e))?;
    let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
    extract_tar(decoder, dest)
}

fn extract_zip(archive_path: &Path, dest: &Path) -> std::result::Result<(), String> {
    let file = File::open(archive_path).map_err(|e| format!("cannot open: {}", e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| format!("zip read error: {}", e))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| format!("zip entry error: {}", e))?;

        let Some(rel) = file.enclosed_name() else {
            return Err(format!("unsafe path: {}", file.name()));
        };
        let outpath = dest.join(rel);

        if file.is_dir() {
            std::fs::create_dir_all(&outpath)
                .map_err(|e| format!("cannot create directory {}: {}", outpath.display(), e))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create directory {}: {}", parent.display(), e))?;
        }
        ensure_no_symlink_components(dest, &outpath)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            // macOS bundles carry framework symlinks stored as S_IFLNK entries.
            if let Some(mode) = file.unix_mode()
                && mode & 0o170000 == 0o120000
            {
                let mut target = String::new();
                file.read_to_string(&mut target)
                    .map_err(|e| format!("read error for {}: {}", outpath.display(), e))?;
                let link_parent = outpath.parent().unwrap_or(dest);
                ensure_link_target_within_dest(dest, link_parent, Path::new(&target))?;
                std::os::unix::fs::symlink(&target, &outpath)
                    .map_err(|e| format!("cannot link {}: {}", outpath.display(), e))?;
                continue;
            }

            let mut outfile = File::create(&outpath)
                .map_err(|e| format!("cannot create {}: {}", outpath.display(), e))?;
            std::io::copy(&mut file, &mut outfile)
                .map_err(|e| format!("write error for {}: {}", outpath.display(), e))?;
            if let Some(mode) = file.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode & 0o7777))
                    .ok();
            }
        }

        #[cfg(not(unix))]
        {
            let mut outfile = File::create(&outpath)
                .map_err(|e| format!("cannot create {}: {}", outpath.display(), e))?;
            std::io::copy(&mut file, &mut outfile)
                .map_err(|e| format!("write error for {}: {}", outpath.display(), e))?;
        }
    }

    Ok(())
}

/// Extract an archive into `dest`, detecting the format from its name.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let format = ArchiveFormat::detect(archive)
        .ok_or_else(|| extract_err(archive, "cannot detect archive format"))?;
    extract_with_format(archive, dest, format)
}

/// Extract an archive into `dest` with an explicit format.
pub fn extract_with_format(archive: &Path, dest: &Path, format: ArchiveFormat) -> Result<()> {
    std::fs::create_dir_all(dest)?;

    let filename = archive
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());

    let result = {
        let _guard = ProgressGuard::new(progress::create_spinner(&format!("extracting {}", filename)));
        match format {
            ArchiveFormat::TarGz => extract_tar_gz(archive, dest),
            ArchiveFormat::Zip => extract_zip(archive, dest),
        }
    };

    result.map_err(|reason| extract_err(archive, reason))?;
    output::detail(&format!("extracted {} to {}", filename, dest.display()));
    Ok(())
}
