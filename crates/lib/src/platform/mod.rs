//! Host platform queries: architecture naming and well-known directories.

pub mod arch;
pub mod paths;

pub use arch::{Arch, deb_to_platform, host_deb_arch};
