//! Architecture naming.
//!
//! Projects name target architectures the way Debian packaging does
//! (`amd64`, `arm64`, ...), while build tooling and the execution engine use
//! platform names as reported by `uname -m` (`x86_64`, `aarch64`, ...).

use std::fmt;

/// CPU architectures with both a Debian and a platform name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  Amd64,
  Arm64,
  Armhf,
  I386,
  Ppc64el,
  Riscv64,
  S390x,
}

impl Arch {
  pub const ALL: [Arch; 7] = [
    Arch::Amd64,
    Arch::Arm64,
    Arch::Armhf,
    Arch::I386,
    Arch::Ppc64el,
    Arch::Riscv64,
    Arch::S390x,
  ];

  /// Detect the architecture of the running binary.
  pub fn current() -> Option<Self> {
    Self::from_platform(std::env::consts::ARCH)
  }

  /// Debian packaging name (e.g. `amd64`).
  pub fn deb_name(&self) -> &'static str {
    match self {
      Self::Amd64 => "amd64",
      Self::Arm64 => "arm64",
      Self::Armhf => "armhf",
      Self::I386 => "i386",
      Self::Ppc64el => "ppc64el",
      Self::Riscv64 => "riscv64",
      Self::S390x => "s390x",
    }
  }

  /// Platform name (e.g. `x86_64`).
  pub fn platform_name(&self) -> &'static str {
    match self {
      Self::Amd64 => "x86_64",
      Self::Arm64 => "aarch64",
      Self::Armhf => "armv7l",
      Self::I386 => "i686",
      Self::Ppc64el => "ppc64le",
      Self::Riscv64 => "riscv64",
      Self::S390x => "s390x",
    }
  }

  pub fn from_deb(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|arch| arch.deb_name() == name)
  }

  /// Parse a platform name. Rust's `arm` and `x86` spellings are accepted too.
  pub fn from_platform(name: &str) -> Option<Self> {
    match name {
      "arm" => Some(Self::Armhf),
      "x86" => Some(Self::I386),
      "powerpc64" => Some(Self::Ppc64el),
      _ => Self::ALL.into_iter().find(|arch| arch.platform_name() == name),
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.deb_name())
  }
}

/// Translate a Debian architecture name to a platform name.
///
/// Unknown names are passed through unchanged.
pub fn deb_to_platform(name: &str) -> String {
  Arch::from_deb(name)
    .map(|arch| arch.platform_name().to_string())
    .unwrap_or_else(|| name.to_string())
}

/// The host architecture in Debian naming, falling back to the raw Rust name.
pub fn host_deb_arch() -> String {
  Arch::current()
    .map(|arch| arch.deb_name().to_string())
    .unwrap_or_else(|| std::env::consts::ARCH.to_string())
}
