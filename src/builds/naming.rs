//! Naming tables for builds.
//!
//! Three independent lookups keyed by (runtime, quality, flavor, os, arch):
//!
//! - [`api_name`]: path segment for the update service endpoints
//! - [`download_name`]: filename of the published artifact
//! - [`build_name`] / [`executable_path`]: what lands on disk and what runs
//!
//! All of them are pure except [`executable_path`], which checks the
//! filesystem for the legacy server launcher.

use super::kind::{Arch, BuildKind, Flavor, Host, Os, Quality};
use crate::core::error::{BisectError, Result};
use std::path::{Path, PathBuf};

/// Reject combinations outside the documented space.
fn validate(kind: &BuildKind, target: Host) -> Result<()> {
    if kind.runtime.is_server() {
        // Server builds ignore the flavor entirely.
        return if kind.quality.is_alternate() {
            Err(unsupported(kind, target))
        } else {
            Ok(())
        };
    }

    let ok = match kind.flavor {
        Flavor::Default | Flavor::Cli | Flavor::Container => true,
        Flavor::DarwinUniversal => target.os == Os::MacOs,
        Flavor::WindowsUserInstaller | Flavor::WindowsSystemInstaller => target.os == Os::Windows,
        Flavor::LinuxDeb | Flavor::LinuxRpm => target.os == Os::Linux,
        Flavor::LinuxSnap => target.os == Os::Linux && target.arch == Arch::X64,
    };
    let ok = ok && (!kind.quality.is_alternate() || kind.flavor == Flavor::Default);

    if ok { Ok(()) } else { Err(unsupported(kind, target)) }
}

fn unsupported(kind: &BuildKind, target: Host) -> BisectError {
    BisectError::UnsupportedTarget(format!(
        "{} {} build, flavor {}, on {}",
        kind.quality, kind.runtime, kind.flavor, target
    ))
}

fn container_unsupported(kind: &BuildKind, target: Host) -> BisectError {
    BisectError::UnsupportedTarget(format!(
        "{} builds on {} are served from container images, not archives",
        kind.flavor, target
    ))
}

fn product_version<'a>(
    kind: &BuildKind,
    target: Host,
    product_version: Option<&'a str>,
) -> Result<&'a str> {
    product_version.ok_or_else(|| BisectError::MissingProductVersion {
        target: format!("{} {} on {}", kind.quality, kind.flavor, target),
    })
}

/// Desktop/CLI binary base name for a quality.
fn app_binary(quality: Quality) -> &'static str {
    if quality.is_insider() { "code-insiders" } else { "code" }
}

fn deb_arch(arch: Arch) -> &'static str {
    match arch {
        Arch::X64 => "amd64",
        Arch::Arm64 => "arm64",
    }
}

fn rpm_arch(arch: Arch) -> &'static str {
    match arch {
        Arch::X64 => "x86_64",
        Arch::Arm64 => "aarch64",
    }
}

/// Whether [`download_name`] and [`build_name`] need the product version.
pub fn needs_product_version(kind: &BuildKind, host: &Host) -> bool {
    let target = kind.target(host);
    !kind.runtime.is_server()
        && !kind.quality.is_alternate()
        && target.os == Os::Windows
        && kind.flavor != Flavor::Cli
        && kind.flavor != Flavor::Container
}

/// Path segment identifying the build target on the update service.
///
/// ```ignore
/// // desktop stable on Apple silicon
/// assert_eq!(api_name(&kind, &host)?, "darwin-arm64");
/// ```
pub fn api_name(kind: &BuildKind, host: &Host) -> Result<String> {
    let target = kind.target(host);
    validate(kind, target)?;
    let (os, arch) = (target.os.as_str(), target.arch.as_str());

    if kind.runtime.is_server() {
        return Ok(format!("server-{os}-{arch}-web"));
    }

    let name = match (kind.flavor, target.os) {
        (Flavor::Cli, _) => format!("cli-{os}-{arch}"),
        // Container images are always Linux, whatever runs docker.
        (Flavor::Container, _) => format!("linux-{arch}"),
        (Flavor::DarwinUniversal, _) => "darwin-universal".to_owned(),
        (_, Os::MacOs) => match target.arch {
            Arch::X64 => "darwin".to_owned(),
            Arch::Arm64 => "darwin-arm64".to_owned(),
        },
        (Flavor::LinuxDeb, _) => format!("linux-deb-{arch}"),
        (Flavor::LinuxRpm, _) => format!("linux-rpm-{arch}"),
        (Flavor::LinuxSnap, _) => format!("linux-snap-{arch}"),
        (_, Os::Linux) => format!("linux-{arch}"),
        (Flavor::WindowsUserInstaller, _) => format!("win32-{arch}-user"),
        (Flavor::WindowsSystemInstaller, _) => format!("win32-{arch}"),
        (_, Os::Windows) => format!("win32-{arch}-archive"),
    };
    Ok(name)
}

/// Filename of the published artifact.
///
/// Windows desktop artifacts embed the product version, which only the
/// update service knows; pass it from [`super::metadata`].
pub fn download_name(
    kind: &BuildKind,
    host: &Host,
    product_version_hint: Option<&str>,
) -> Result<String> {
    let target = kind.target(host);
    validate(kind, target)?;
    let (os, arch) = (target.os.as_str(), target.arch.as_str());

    if kind.runtime.is_server() {
        return Ok(format!("vscode-server-{os}-{arch}-web.tar.gz"));
    }

    if kind.quality.is_alternate() {
        let ext = match target.os {
            Os::Linux => "tar.gz",
            Os::MacOs | Os::Windows => "zip",
        };
        return Ok(format!("VSCodium-{os}-{arch}.{ext}"));
    }

    let pkg = app_binary(kind.quality);
    let name = match (kind.flavor, target.os) {
        (Flavor::Container, _) => return Err(container_unsupported(kind, target)),
        (Flavor::Cli, Os::Linux) => format!("vscode_cli_linux_{arch}_cli.tar.gz"),
        (Flavor::Cli, _) => format!("vscode_cli_{os}_{arch}_cli.zip"),
        (Flavor::DarwinUniversal, _) => "VSCode-darwin-universal.zip".to_owned(),
        (_, Os::MacOs) => match target.arch {
            Arch::X64 => "VSCode-darwin.zip".to_owned(),
            Arch::Arm64 => "VSCode-darwin-arm64.zip".to_owned(),
        },
        (Flavor::LinuxDeb, _) => format!("{pkg}_{}.deb", deb_arch(target.arch)),
        (Flavor::LinuxRpm, _) => format!("{pkg}.{}.rpm", rpm_arch(target.arch)),
        (Flavor::LinuxSnap, _) => format!("{pkg}_{}.snap", deb_arch(target.arch)),
        (_, Os::Linux) => format!("VSCode-linux-{arch}.tar.gz"),
        (Flavor::WindowsUserInstaller, _) => {
            let pv = product_version(kind, target, product_version_hint)?;
            format!("VSCodeUserSetup-{arch}-{pv}.exe")
        }
        (Flavor::WindowsSystemInstaller, _) => {
            let pv = product_version(kind, target, product_version_hint)?;
            format!("VSCodeSetup-{arch}-{pv}.exe")
        }
        (_, Os::Windows) => {
            let pv = product_version(kind, target, product_version_hint)?;
            format!("VSCode-win32-{arch}-{pv}.zip")
        }
    };
    Ok(name)
}

/// Name of the entry that ends up inside the build's cache directory.
pub fn build_name(
    kind: &BuildKind,
    host: &Host,
    product_version_hint: Option<&str>,
) -> Result<String> {
    let target = kind.target(host);
    validate(kind, target)?;
    let (os, arch) = (target.os.as_str(), target.arch.as_str());

    if kind.runtime.is_server() {
        return Ok(format!("vscode-server-{os}-{arch}-web"));
    }

    if kind.quality.is_alternate() {
        return Ok(match target.os {
            Os::MacOs => "VSCodium - Insiders.app".to_owned(),
            Os::Linux | Os::Windows => format!("VSCodium-{os}-{arch}"),
        });
    }

    if kind.flavor.is_installer() {
        return download_name(kind, host, product_version_hint);
    }

    let name = match (kind.flavor, target.os) {
        (Flavor::Container, _) => return Err(container_unsupported(kind, target)),
        (Flavor::Cli, Os::Windows) => format!("{}.exe", app_binary(kind.quality)),
        (Flavor::Cli, _) => app_binary(kind.quality).to_owned(),
        (_, Os::MacOs) => {
            if kind.quality.is_insider() {
                "Visual Studio Code - Insiders.app".to_owned()
            } else {
                "Visual Studio Code.app".to_owned()
            }
        }
        (_, Os::Linux) => format!("VSCode-linux-{arch}"),
        (_, Os::Windows) => {
            let pv = product_version(kind, target, product_version_hint)?;
            format!("VSCode-win32-{arch}-{pv}")
        }
    };
    Ok(name)
}

/// Whether the archive has no single top-level folder and must be unpacked
/// into a directory named after [`build_name`] instead of beside itself.
pub fn extracts_into_named_dir(kind: &BuildKind, host: &Host) -> bool {
    let target = kind.target(host);
    if kind.runtime.is_server() || kind.flavor.is_installer() {
        return false;
    }
    if kind.quality.is_alternate() {
        return target.os != Os::MacOs;
    }
    target.os == Os::Windows && kind.flavor == Flavor::Default
}

/// Path of the runnable entry point of a materialized build.
///
/// `build_dir` is the build's cache directory and `name` the result of
/// [`build_name`] for the same build.
pub fn executable_path(
    build_dir: &Path,
    name: &str,
    kind: &BuildKind,
    host: &Host,
) -> Result<PathBuf> {
    let target = kind.target(host);
    validate(kind, target)?;
    let root = build_dir.join(name);

    if kind.runtime.is_server() {
        let (legacy, launcher) = match target.os {
            Os::Windows => ("server.cmd", format!("{}.cmd", server_launcher(kind.quality))),
            Os::MacOs | Os::Linux => ("server.sh", server_launcher(kind.quality).to_owned()),
        };
        // Older server builds shipped a launcher script at the top level.
        let legacy = root.join(legacy);
        if legacy.exists() {
            return Ok(legacy);
        }
        return Ok(root.join("bin").join(launcher));
    }

    if kind.quality.is_alternate() {
        return Ok(match target.os {
            Os::MacOs => root.join("Contents").join("MacOS").join("Electron"),
            Os::Linux => root.join("codium-insiders"),
            Os::Windows => root.join("VSCodium - Insiders.exe"),
        });
    }

    if kind.flavor.is_installer() || kind.flavor == Flavor::Cli {
        return Ok(root);
    }

    match (kind.flavor, target.os) {
        (Flavor::Container, _) => Err(container_unsupported(kind, target)),
        (_, Os::MacOs) => Ok(root.join("Contents").join("MacOS").join("Electron")),
        (_, Os::Linux) => Ok(root.join(app_binary(kind.quality))),
        (_, Os::Windows) => {
            if kind.quality.is_insider() {
                Ok(root.join("Code - Insiders.exe"))
            } else {
                Ok(root.join("Code.exe"))
            }
        }
    }
}

fn server_launcher(quality: Quality) -> &'static str {
    if quality.is_insider() {
        "code-server-insiders"
    } else {
        "code-server"
    }
}

/// Key of the alternate channel's asset map for a target.
pub fn alternate_asset_key(target: Host) -> String {
    format!("{}_{}", target.os.as_str(), target.arch.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builds::kind::Runtime;

    const ALL_RUNTIMES: [Runtime; 3] = [Runtime::DesktopLocal, Runtime::WebLocal, Runtime::WebRemote];
    const ALL_QUALITIES: [Quality; 3] = [Quality::Stable, Quality::Insider, Quality::CodiumInsider];
    const ALL_FLAVORS: [Flavor; 9] = [
        Flavor::Default,
        Flavor::Cli,
        Flavor::DarwinUniversal,
        Flavor::WindowsUserInstaller,
        Flavor::WindowsSystemInstaller,
        Flavor::LinuxDeb,
        Flavor::LinuxRpm,
        Flavor::LinuxSnap,
        Flavor::Container,
    ];
    const ALL_OS: [Os; 3] = [Os::MacOs, Os::Linux, Os::Windows];
    const ALL_ARCH: [Arch; 2] = [Arch::X64, Arch::Arm64];

    fn desktop(quality: Quality, flavor: Flavor) -> BuildKind {
        BuildKind::new(Runtime::DesktopLocal, quality, flavor)
    }

    fn host(os: Os, arch: Arch) -> Host {
        Host::new(os, arch)
    }

    #[test]
    fn test_server_api_name_ignores_flavor() {
        let h = host(Os::Linux, Arch::Arm64);
        for flavor in ALL_FLAVORS {
            let kind = BuildKind::new(Runtime::WebLocal, Quality::Insider, flavor);
            assert_eq!(api_name(&kind, &h).unwrap(), "server-linux-arm64-web");
        }
        let kind = BuildKind::new(Runtime::WebRemote, Quality::Stable, Flavor::Default);
        assert_eq!(
            api_name(&kind, &host(Os::MacOs, Arch::X64)).unwrap(),
            "server-darwin-x64-web"
        );
    }

    #[test]
    fn test_desktop_api_names() {
        let cases = [
            (Flavor::Default, Os::MacOs, Arch::X64, "darwin"),
            (Flavor::Default, Os::MacOs, Arch::Arm64, "darwin-arm64"),
            (Flavor::DarwinUniversal, Os::MacOs, Arch::Arm64, "darwin-universal"),
            (Flavor::Default, Os::Linux, Arch::X64, "linux-x64"),
            (Flavor::LinuxDeb, Os::Linux, Arch::Arm64, "linux-deb-arm64"),
            (Flavor::LinuxRpm, Os::Linux, Arch::X64, "linux-rpm-x64"),
            (Flavor::LinuxSnap, Os::Linux, Arch::X64, "linux-snap-x64"),
            (Flavor::Default, Os::Windows, Arch::X64, "win32-x64-archive"),
            (Flavor::WindowsUserInstaller, Os::Windows, Arch::Arm64, "win32-arm64-user"),
            (Flavor::WindowsSystemInstaller, Os::Windows, Arch::X64, "win32-x64"),
            (Flavor::Cli, Os::MacOs, Arch::Arm64, "cli-darwin-arm64"),
            (Flavor::Cli, Os::Windows, Arch::X64, "cli-win32-x64"),
            (Flavor::Container, Os::MacOs, Arch::Arm64, "linux-arm64"),
        ];
        for (flavor, os, arch, expected) in cases {
            let kind = desktop(Quality::Stable, flavor);
            assert_eq!(api_name(&kind, &host(os, arch)).unwrap(), expected, "{flavor} {os} {arch}");
        }
    }

    #[test]
    fn test_explicit_target_overrides_host() {
        let kind = desktop(Quality::Stable, Flavor::Default).with_target(Os::Windows, Arch::Arm64);
        assert_eq!(
            api_name(&kind, &host(Os::Linux, Arch::X64)).unwrap(),
            "win32-arm64-archive"
        );
    }

    #[test]
    fn test_flavor_outside_its_platform_is_rejected() {
        let kind = desktop(Quality::Stable, Flavor::DarwinUniversal);
        let err = api_name(&kind, &host(Os::Linux, Arch::X64)).unwrap_err();
        assert!(matches!(err, BisectError::UnsupportedTarget(_)));

        let kind = desktop(Quality::Stable, Flavor::LinuxSnap);
        assert!(api_name(&kind, &host(Os::Linux, Arch::Arm64)).is_err());

        let kind = desktop(Quality::CodiumInsider, Flavor::Cli);
        assert!(api_name(&kind, &host(Os::Linux, Arch::X64)).is_err());
    }

    #[test]
    fn test_download_names() {
        let h = host(Os::Linux, Arch::X64);
        assert_eq!(
            download_name(&desktop(Quality::Stable, Flavor::Default), &h, None).unwrap(),
            "VSCode-linux-x64.tar.gz"
        );
        assert_eq!(
            download_name(&desktop(Quality::Insider, Flavor::LinuxDeb), &h, None).unwrap(),
            "code-insiders_amd64.deb"
        );
        assert_eq!(
            download_name(&desktop(Quality::Stable, Flavor::Cli), &h, None).unwrap(),
            "vscode_cli_linux_x64_cli.tar.gz"
        );

        let mac = host(Os::MacOs, Arch::Arm64);
        assert_eq!(
            download_name(&desktop(Quality::Stable, Flavor::Default), &mac, None).unwrap(),
            "VSCode-darwin-arm64.zip"
        );
        let server = BuildKind::new(Runtime::WebRemote, Quality::Stable, Flavor::Default);
        assert_eq!(
            download_name(&server, &mac, None).unwrap(),
            "vscode-server-darwin-arm64-web.tar.gz"
        );
    }

    #[test]
    fn test_windows_names_need_product_version() {
        let win = host(Os::Windows, Arch::X64);
        let kind = desktop(Quality::Stable, Flavor::Default);
        assert!(needs_product_version(&kind, &win));

        let err = download_name(&kind, &win, None).unwrap_err();
        assert!(matches!(err, BisectError::MissingProductVersion { .. }));
        assert_eq!(
            download_name(&kind, &win, Some("1.80.0")).unwrap(),
            "VSCode-win32-x64-1.80.0.zip"
        );
        assert_eq!(
            build_name(&kind, &win, Some("1.80.0")).unwrap(),
            "VSCode-win32-x64-1.80.0"
        );

        let installer = desktop(Quality::Stable, Flavor::WindowsUserInstaller);
        assert_eq!(
            download_name(&installer, &win, Some("1.80.0")).unwrap(),
            "VSCodeUserSetup-x64-1.80.0.exe"
        );
        assert_eq!(
            build_name(&installer, &win, Some("1.80.0")).unwrap(),
            "VSCodeUserSetup-x64-1.80.0.exe"
        );

        assert!(!needs_product_version(&desktop(Quality::Stable, Flavor::Cli), &win));
        assert!(!needs_product_version(&kind, &host(Os::Linux, Arch::X64)));
    }

    #[test]
    fn test_build_names() {
        let mac = host(Os::MacOs, Arch::X64);
        assert_eq!(
            build_name(&desktop(Quality::Insider, Flavor::Default), &mac, None).unwrap(),
            "Visual Studio Code - Insiders.app"
        );
        assert_eq!(
            build_name(&desktop(Quality::CodiumInsider, Flavor::Default), &mac, None).unwrap(),
            "VSCodium - Insiders.app"
        );
        let linux = host(Os::Linux, Arch::Arm64);
        assert_eq!(
            build_name(&desktop(Quality::CodiumInsider, Flavor::Default), &linux, None).unwrap(),
            "VSCodium-linux-arm64"
        );
        assert_eq!(
            build_name(&desktop(Quality::Stable, Flavor::Cli), &host(Os::Windows, Arch::X64), None)
                .unwrap(),
            "code.exe"
        );
    }

    #[test]
    fn test_container_has_no_archive_names() {
        let kind = desktop(Quality::Stable, Flavor::Container);
        let h = host(Os::Linux, Arch::X64);
        assert!(download_name(&kind, &h, None).is_err());
        assert!(build_name(&kind, &h, None).is_err());
    }

    #[test]
    fn test_extract_shape() {
        let win = host(Os::Windows, Arch::X64);
        let linux = host(Os::Linux, Arch::X64);
        let mac = host(Os::MacOs, Arch::Arm64);
        assert!(extracts_into_named_dir(&desktop(Quality::Stable, Flavor::Default), &win));
        assert!(!extracts_into_named_dir(&desktop(Quality::Stable, Flavor::Cli), &win));
        assert!(!extracts_into_named_dir(&desktop(Quality::Stable, Flavor::Default), &linux));
        assert!(extracts_into_named_dir(&desktop(Quality::CodiumInsider, Flavor::Default), &linux));
        assert!(!extracts_into_named_dir(&desktop(Quality::CodiumInsider, Flavor::Default), &mac));
        let server = BuildKind::new(Runtime::WebLocal, Quality::Stable, Flavor::Default);
        assert!(!extracts_into_named_dir(&server, &win));
    }

    #[test]
    fn test_server_prefers_legacy_launcher() {
        let dir = tempfile::tempdir().unwrap();
        let kind = BuildKind::new(Runtime::WebLocal, Quality::Insider, Flavor::Default);
        let h = host(Os::Linux, Arch::X64);
        let name = build_name(&kind, &h, None).unwrap();

        let modern = executable_path(dir.path(), &name, &kind, &h).unwrap();
        assert_eq!(
            modern,
            dir.path().join(&name).join("bin").join("code-server-insiders")
        );

        let legacy = dir.path().join(&name).join("server.sh");
        std::fs::create_dir_all(legacy.parent().unwrap()).unwrap();
        std::fs::write(&legacy, "#!/bin/sh\n").unwrap();
        assert_eq!(executable_path(dir.path(), &name, &kind, &h).unwrap(), legacy);
    }

    #[test]
    fn test_desktop_executables() {
        let dir = Path::new("/cache/stable/default/abc");
        let mac = host(Os::MacOs, Arch::Arm64);
        let kind = desktop(Quality::Stable, Flavor::Default);
        assert_eq!(
            executable_path(dir, "Visual Studio Code.app", &kind, &mac).unwrap(),
            dir.join("Visual Studio Code.app/Contents/MacOS/Electron")
        );
        let win = host(Os::Windows, Arch::X64);
        let insider = desktop(Quality::Insider, Flavor::Default);
        assert_eq!(
            executable_path(dir, "VSCode-win32-x64-1.81.0", &insider, &win).unwrap(),
            dir.join("VSCode-win32-x64-1.81.0").join("Code - Insiders.exe")
        );
        let linux = host(Os::Linux, Arch::X64);
        let cli = desktop(Quality::Insider, Flavor::Cli);
        assert_eq!(
            executable_path(dir, "code-insiders", &cli, &linux).unwrap(),
            dir.join("code-insiders")
        );
    }

    #[test]
    fn test_asset_key() {
        assert_eq!(alternate_asset_key(host(Os::MacOs, Arch::Arm64)), "darwin_arm64");
        assert_eq!(alternate_asset_key(host(Os::Windows, Arch::X64)), "win32_x64");
    }

    #[test]
    fn test_tables_are_deterministic_and_total() {
        for runtime in ALL_RUNTIMES {
            for quality in ALL_QUALITIES {
                for flavor in ALL_FLAVORS {
                    for os in ALL_OS {
                        for arch in ALL_ARCH {
                            let kind = BuildKind::new(runtime, quality, flavor);
                            let h = host(os, arch);
                            let first = (
                                api_name(&kind, &h).ok(),
                                download_name(&kind, &h, Some("1.2.3")).ok(),
                                build_name(&kind, &h, Some("1.2.3")).ok(),
                            );
                            let second = (
                                api_name(&kind, &h).ok(),
                                download_name(&kind, &h, Some("1.2.3")).ok(),
                                build_name(&kind, &h, Some("1.2.3")).ok(),
                            );
                            assert_eq!(first, second);

                            // Anything with an API name is either nameable on
                            // disk or one of the container-served flavors.
                            if first.0.is_some() && flavor != Flavor::Container {
                                assert!(first.1.is_some(), "{kind:?} on {h}");
                                assert!(first.2.is_some(), "{kind:?} on {h}");
                            }
                        }
                    }
                }
            }
        }
    }
}
