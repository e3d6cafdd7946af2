//! Version query for a Windows host

use windows::Wdk::System::SystemServices::RtlGetVersion;
use windows::Win32::System::SystemInformation::OSVERSIONINFOW;

use super::HostVersion;
use crate::error::{Error, Result};

/// Version reported by `RtlGetVersion`, captured once.
///
/// Unlike `GetVersionExW` this is not subject to manifest-based shims, so it
/// reports the real kernel version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowsVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl WindowsVersion {
    pub fn detect() -> Result<Self> {
        let mut info = OSVERSIONINFOW {
            dwOSVersionInfoSize: std::mem::size_of::<OSVERSIONINFOW>() as u32,
            ..Default::default()
        };

        // SAFETY: `info` is a properly sized, writable OSVERSIONINFOW.
        let status = unsafe { RtlGetVersion(&mut info) };
        if status.is_err() {
            return Err(Error::HostQueryFailed(format!(
                "RtlGetVersion failed: 0x{:08X}",
                status.0
            )));
        }

        Ok(Self {
            major: info.dwMajorVersion,
            minor: info.dwMinorVersion,
            build: info.dwBuildNumber,
        })
    }
}

impl HostVersion for WindowsVersion {
    fn os_version(&self) -> (u32, u32) {
        (self.major, self.minor)
    }
}
