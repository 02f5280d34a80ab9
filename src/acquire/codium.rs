//! Alternate-channel acquisition (VSCodium insider builds).
//!
//! Download URLs come from the asset map recorded in the local history, so
//! there is no metadata request and no checksum to verify. macOS archives
//! are unpacked with the system `unzip`, which keeps the bundle's resource
//! forks, and the bundle can then be patched to use the official extension
//! gallery, stripped of quarantine attributes and re-signed ad hoc.

use super::{BuildAcquirer, mark_complete, remove_archive};
use crate::builds::kind::{Build, Os};
use crate::builds::naming;
use crate::core::config::MarketplaceConfig;
use crate::core::error::{BisectError, Result};
use crate::core::output;
use crate::helpers::{download, extract, process};
use std::path::{Path, PathBuf};

pub(super) fn acquire(acquirer: &BuildAcquirer<'_>, build: &Build, force: bool) -> Result<PathBuf> {
    let config = acquirer.config;
    let host = &config.host;
    let target = build.kind.target(host);

    let dir = acquirer.build_path(build);
    if !acquirer.prepare_cache_dir(&dir, build, force)? {
        return Ok(dir);
    }

    let platform = naming::alternate_asset_key(target);
    let url = build
        .assets
        .as_ref()
        .and_then(|assets| assets.get(&platform))
        .ok_or_else(|| BisectError::MissingAsset {
            commit: build.commit.clone(),
            platform: platform.clone(),
        })?;

    output::action(&format!(
        "Acquiring {} build {} ({})",
        build.kind.quality,
        build.short_commit(),
        platform
    ));

    let archive = dir.join(naming::download_name(&build.kind, host, None)?);
    let name = naming::build_name(&build.kind, host, None)?;
    output::sub_action("download");
    download::download(url, &archive, config.http_timeout)?;

    output::sub_action("extract");
    match target.os {
        Os::MacOs => {
            let archive_arg = archive.to_string_lossy();
            let dir_arg = dir.to_string_lossy();
            process::run_tool("unzip", &["-q", &archive_arg, "-d", &dir_arg])?;
            remove_archive(&archive);

            if config.patch_alternate_bundle {
                patch_bundle(&dir.join(&name), &config.marketplace)?;
            }
        }
        Os::Linux | Os::Windows => {
            extract::extract(&archive, &dir.join(&name))?;
            remove_archive(&archive);
        }
    }
    mark_complete(&dir, build.version.as_deref())?;

    output::success(&format!("{} ready at {}", build.short_commit(), dir.display()));
    Ok(dir)
}

fn patch_bundle(app: &Path, marketplace: &MarketplaceConfig) -> Result<()> {
    output::sub_action("patch bundle");
    patch_product_json(app, marketplace)?;

    let app_arg = app.to_string_lossy();
    process::run_tool("xattr", &["-cr", &app_arg])?;
    process::run_tool("codesign", &["--force", "--deep", "--sign", "-", &app_arg])?;
    Ok(())
}

/// Point a macOS bundle at `marketplace` and label it as an insider build.
///
/// Rewrites `Contents/Resources/app/product.json`, keeping every other key.
pub fn patch_product_json(app: &Path, marketplace: &MarketplaceConfig) -> Result<()> {
    let path = product_json_path(app);
    let text = std::fs::read_to_string(&path)?;
    let mut product: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        std::io::Error::other(format!("invalid {}: {}", path.display(), e))
    })?;

    let Some(fields) = product.as_object_mut() else {
        return Err(std::io::Error::other(format!("{} is not a JSON object", path.display())).into());
    };
    fields.insert(
        "extensionsGallery".to_owned(),
        serde_json::json!({
            "serviceUrl": marketplace.service_url,
            "itemUrl": marketplace.item_url,
            "cacheUrl": marketplace.cache_url,
        }),
    );
    fields.insert("quality".to_owned(), serde_json::Value::from("insider"));

    let patched = serde_json::to_string_pretty(&product).map_err(std::io::Error::other)?;
    std::fs::write(&path, patched)?;
    output::detail(&format!("patched {}", path.display()));
    Ok(())
}

fn product_json_path(app: &Path) -> PathBuf {
    app.join("Contents")
        .join("Resources")
        .join("app")
        .join("product.json")
}
