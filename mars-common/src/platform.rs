use anyhow::{anyhow, Result};
use std::env;
use std::fmt;

/// Host platform tag, fixed for the lifetime of the process.
///
/// The tags match the naming used by the Geth release archives and the
/// installer layout, not Rust's own target triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKey {
    DarwinArm64,
    DarwinX64,
    Win32X64,
    Win32Arm64,
    LinuxX64,
    LinuxArm64,
}

impl PlatformKey {
    /// Detect the platform key for the current host.
    pub fn detect() -> Result<Self> {
        Self::from_os_arch(env::consts::OS, env::consts::ARCH)
    }

    pub fn from_os_arch(os: &str, arch: &str) -> Result<Self> {
        match (os, arch) {
            ("macos", "aarch64") => Ok(PlatformKey::DarwinArm64),
            ("macos", "x86_64") => Ok(PlatformKey::DarwinX64),
            ("windows", "x86_64") => Ok(PlatformKey::Win32X64),
            ("windows", "aarch64") => Ok(PlatformKey::Win32Arm64),
            ("linux", "x86_64") => Ok(PlatformKey::LinuxX64),
            ("linux", "aarch64") => Ok(PlatformKey::LinuxArm64),
            _ => Err(anyhow!("Unsupported platform: {} {}", os, arch)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKey::DarwinArm64 => "darwin-arm64",
            PlatformKey::DarwinX64 => "darwin-x64",
            PlatformKey::Win32X64 => "win32-x64",
            PlatformKey::Win32Arm64 => "win32-arm64",
            PlatformKey::LinuxX64 => "linux-x64",
            PlatformKey::LinuxArm64 => "linux-arm64",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, PlatformKey::Win32X64 | PlatformKey::Win32Arm64)
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_mappings() {
        assert_eq!(
            PlatformKey::from_os_arch("macos", "aarch64").unwrap(),
            PlatformKey::DarwinArm64
        );
        assert_eq!(
            PlatformKey::from_os_arch("linux", "x86_64").unwrap(),
            PlatformKey::LinuxX64
        );
        assert_eq!(
            PlatformKey::from_os_arch("windows", "x86_64").unwrap(),
            PlatformKey::Win32X64
        );
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        assert!(PlatformKey::from_os_arch("freebsd", "x86_64").is_err());
        assert!(PlatformKey::from_os_arch("linux", "riscv64").is_err());
    }

    #[test]
    fn test_detect_matches_host() {
        // The test host is one of the supported platforms.
        let key = PlatformKey::detect().unwrap();
        assert_eq!(key.is_windows(), cfg!(windows));
    }

    #[test]
    fn test_display_tags() {
        assert_eq!(PlatformKey::DarwinArm64.to_string(), "darwin-arm64");
        assert_eq!(PlatformKey::Win32Arm64.to_string(), "win32-arm64");
    }
}
