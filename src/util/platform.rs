//! Running platform detection.
//!
//! The canonical OS and architecture names defined here are shared by the
//! seeded platform hints (`OS:LINUX`, `ARCH:X64`, ...) and by installation
//! conformance checks, so an installation conforms only when its resolved
//! names equal these.

use std::fmt;

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Os {
    /// Canonical upper-case name used in hints and alias tables.
    pub fn canonical(self) -> &'static str {
        match self {
            Os::Linux => "LINUX",
            Os::MacOs => "MACOSX",
            Os::Windows => "WINDOWS",
            Os::Other => "UNKNOWN",
        }
    }

    /// Lower-case name used in config file names.
    pub fn file_token(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Windows => "windows",
            Os::Other => "unknown",
        }
    }

    fn current() -> Self {
        match std::env::consts::OS {
            "linux" => Os::Linux,
            "macos" => Os::MacOs,
            "windows" => Os::Windows,
            _ => Os::Other,
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X64,
    Arm64,
    X86,
    Arm32,
    Other,
}

impl Arch {
    /// Canonical upper-case name used in hints and alias tables.
    pub fn canonical(self) -> &'static str {
        match self {
            Arch::X64 => "X64",
            Arch::Arm64 => "ARM64",
            Arch::X86 => "X86",
            Arch::Arm32 => "ARM32",
            Arch::Other => "UNKNOWN",
        }
    }

    /// Lower-case name used in config file names.
    pub fn file_token(self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
            Arch::X86 => "x86",
            Arch::Arm32 => "arm32",
            Arch::Other => "unknown",
        }
    }

    fn current() -> Self {
        match std::env::consts::ARCH {
            "x86_64" => Arch::X64,
            "aarch64" => Arch::Arm64,
            "x86" => Arch::X86,
            "arm" => Arch::Arm32,
            _ => Arch::Other,
        }
    }
}

/// The platform the engine is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: Os, arch: Arch) -> Self {
        Platform { os, arch }
    }

    /// Detect the running platform.
    pub fn current() -> Self {
        Platform {
            os: Os::current(),
            arch: Arch::current(),
        }
    }

    /// Hints seeded into every resolution pass.
    pub fn hints(&self) -> Vec<String> {
        vec![
            format!("OS:{}", self.os.canonical()),
            format!("ARCH:{}", self.arch.canonical()),
        ]
    }

    /// Separator between class path entries.
    pub fn path_separator(&self) -> char {
        if self.os == Os::Windows {
            ';'
        } else {
            ':'
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.file_token(), self.arch.file_token())
    }
}
