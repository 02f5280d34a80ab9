//! Build history, reference resolution and naming.

pub mod history;
pub mod kind;
pub mod metadata;
pub mod naming;
pub mod range;
pub mod reference;

pub use history::HistorySource;
pub use kind::{
    Arch, Build, BuildDate, BuildKind, BuildMetadata, Flavor, HistoryOrder, Host, Os, Quality,
    Runtime,
};
pub use metadata::{fetch_build_by_version, fetch_metadata};
pub use range::{RangeRequest, resolve_range};
