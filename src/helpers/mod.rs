//! Plumbing shared by the acquisition stages
//!
//! - **http**: GET + JSON decoding against the update service
//! - **download**: streaming artifact downloads
//! - **hash**: SHA-256 integrity checks
//! - **extract**: tar.gz / zip extraction
//! - **process**: synchronous external tool invocation
//! - **progress**: indicatif styling

pub mod download;
pub mod extract;
pub mod hash;
pub mod http;
pub mod process;
pub mod progress;
