//! Build identity types.
//!
//! Every axis is a closed enum so the naming tables in [`super::naming`] are
//! checked for exhaustiveness at compile time.

use chrono::{DateTime, TimeZone, Utc};
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Where a build is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Runtime {
    #[value(name = "desktop")]
    DesktopLocal,
    WebLocal,
    WebRemote,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DesktopLocal => "desktop",
            Self::WebLocal => "web-local",
            Self::WebRemote => "web-remote",
        }
    }

    /// Web runtimes are served by the server build.
    pub fn is_server(&self) -> bool {
        matches!(self, Self::WebLocal | Self::WebRemote)
    }
}

/// Release channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Quality {
    Stable,
    Insider,
    /// Community redistribution tracking insider commits.
    CodiumInsider,
}

/// How a local history file is ordered on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOrder {
    OldestFirst,
    NewestFirst,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Insider => "insider",
            Self::CodiumInsider => "codium-insider",
        }
    }

    /// Builds of this quality come from the alternate distribution.
    pub fn is_alternate(&self) -> bool {
        matches!(self, Self::CodiumInsider)
    }

    pub fn is_insider(&self) -> bool {
        matches!(self, Self::Insider | Self::CodiumInsider)
    }

    /// Quality segment used by the update service.
    pub fn api_segment(&self) -> &'static str {
        if self.is_insider() { "insider" } else { "stable" }
    }

    pub fn history_file(&self) -> &'static str {
        match self {
            Self::Stable => "vscode_stable_history.json",
            Self::Insider => "vscode_insider_history.json",
            Self::CodiumInsider => "vscodium_insider_history.json",
        }
    }

    /// Primary-channel files are sorted by version ascending; the alternate
    /// channel file keeps GitHub release order, which is newest first.
    pub fn history_order(&self) -> HistoryOrder {
        match self {
            Self::Stable | Self::Insider => HistoryOrder::OldestFirst,
            Self::CodiumInsider => HistoryOrder::NewestFirst,
        }
    }
}

/// Packaging variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Flavor {
    Default,
    Cli,
    DarwinUniversal,
    #[value(name = "win32-user-installer")]
    WindowsUserInstaller,
    #[value(name = "win32-system-installer")]
    WindowsSystemInstaller,
    LinuxDeb,
    LinuxRpm,
    LinuxSnap,
    /// Packaged inside a container image.
    Container,
}

impl Flavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Cli => "cli",
            Self::DarwinUniversal => "darwin-universal",
            Self::WindowsUserInstaller => "win32-user-installer",
            Self::WindowsSystemInstaller => "win32-system-installer",
            Self::LinuxDeb => "linux-deb",
            Self::LinuxRpm => "linux-rpm",
            Self::LinuxSnap => "linux-snap",
            Self::Container => "container",
        }
    }

    /// Installer artifacts are the deliverable and are never unpacked.
    pub fn is_installer(&self) -> bool {
        matches!(
            self,
            Self::WindowsUserInstaller
                | Self::WindowsSystemInstaller
                | Self::LinuxDeb
                | Self::LinuxRpm
                | Self::LinuxSnap
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Os {
    #[value(name = "darwin")]
    MacOs,
    Linux,
    #[value(name = "win32")]
    Windows,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MacOs => "darwin",
            Self::Linux => "linux",
            Self::Windows => "win32",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Arch {
    X64,
    Arm64,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Runtime, Quality, Flavor, Os, Arch);

/// A concrete (os, arch) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Host {
    pub os: Os,
    pub arch: Arch,
}

impl Host {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The machine this process runs on.
    pub fn detect() -> Self {
        let os = match std::env::consts::OS {
            "macos" => Os::MacOs,
            "windows" => Os::Windows,
            _ => Os::Linux,
        };
        let arch = match std::env::consts::ARCH {
            "aarch64" => Arch::Arm64,
            _ => Arch::X64,
        };
        Self { os, arch }
    }

    pub fn is_apple_silicon(&self) -> bool {
        self.os == Os::MacOs && self.arch == Arch::Arm64
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Identity fragment shared by every build of a bisection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildKind {
    pub runtime: Runtime,
    pub quality: Quality,
    pub flavor: Flavor,
    pub os: Option<Os>,
    pub arch: Option<Arch>,
}

impl BuildKind {
    pub fn new(runtime: Runtime, quality: Quality, flavor: Flavor) -> Self {
        Self {
            runtime,
            quality,
            flavor,
            os: None,
            arch: None,
        }
    }

    pub fn with_target(mut self, os: Os, arch: Arch) -> Self {
        self.os = Some(os);
        self.arch = Some(arch);
        self
    }

    /// Platform and architecture, falling back to the host's for unset axes.
    pub fn target(&self, host: &Host) -> Host {
        Host {
            os: self.os.unwrap_or(host.os),
            arch: self.arch.unwrap_or(host.arch),
        }
    }
}

/// A point in time as recorded by the history generators: epoch
/// milliseconds from the update service or an RFC 3339 string from GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BuildDate {
    EpochMillis(i64),
    Iso(String),
}

impl BuildDate {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::EpochMillis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Self::Iso(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// One entry of a quality tier's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    pub kind: BuildKind,
    pub commit: String,
    pub date: Option<BuildDate>,
    pub version: Option<String>,
    /// Alternate channel only: platform key (`darwin_arm64`, ...) to URL.
    pub assets: Option<BTreeMap<String, String>>,
}

impl Build {
    /// A build known only by commit, as returned by discovery.
    pub fn from_commit(kind: BuildKind, commit: impl Into<String>) -> Self {
        Self {
            kind,
            commit: commit.into(),
            date: None,
            version: None,
            assets: None,
        }
    }

    /// First seven characters of the commit, for display.
    pub fn short_commit(&self) -> &str {
        self.commit.get(..7).unwrap_or(&self.commit)
    }
}

/// Per-build download information from the update service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMetadata {
    pub url: String,
    /// The update service reports the build commit here.
    pub version: String,
    pub product_version: String,
    pub sha256hash: String,
}
