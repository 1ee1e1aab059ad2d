//! Device discovery and selection.

use crate::backend;
use mokt_common::{KernelTestError, Result};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Device type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Gpu,
    Cpu,
    Accelerator,
    Other,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu => write!(f, "GPU"),
            Self::Cpu => write!(f, "CPU"),
            Self::Accelerator => write!(f, "Accelerator"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// What the harness needs to know about a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Position in the runtime's enumeration order across all platforms.
    pub index: usize,
    pub name: String,
    pub vendor: String,
    /// OpenCL version string reported by the device.
    pub version: String,
    pub kind: DeviceKind,
    pub compute_units: u32,
    /// Largest work-group the device accepts (product of local sizes).
    pub max_work_group_size: usize,
    pub global_mem_bytes: u64,
    pub supports_fp64: bool,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}, {}, {} CUs, {:.1} GiB, max work-group {}{})",
            self.index,
            self.name,
            self.vendor,
            self.kind,
            self.compute_units,
            self.global_mem_bytes as f64 / (1u64 << 30) as f64,
            self.max_work_group_size,
            if self.supports_fp64 { ", fp64" } else { "" }
        )
    }
}

/// Policy for picking one device out of the enumerated set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceSelector {
    /// First GPU, otherwise the first device of any kind.
    #[default]
    PreferGpu,
    /// First enumerated device.
    FirstAvailable,
    /// Device at a fixed enumeration index.
    Index(usize),
    /// First device whose name contains the needle, case-insensitively.
    NameContains(String),
    /// First device of the given kind.
    Kind(DeviceKind),
}

impl DeviceSelector {
    /// Apply the policy to an enumerated device list.
    pub fn select<'a>(&self, devices: &'a [DeviceInfo]) -> Option<&'a DeviceInfo> {
        match self {
            Self::PreferGpu => devices
                .iter()
                .find(|d| d.kind == DeviceKind::Gpu)
                .or_else(|| devices.first()),
            Self::FirstAvailable => devices.first(),
            Self::Index(i) => devices.iter().find(|d| d.index == *i),
            Self::NameContains(needle) => {
                let needle = needle.to_lowercase();
                devices.iter().find(|d| d.name.to_lowercase().contains(&needle))
            }
            Self::Kind(kind) => devices.iter().find(|d| d.kind == *kind),
        }
    }
}

impl FromStr for DeviceSelector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(needle) = trimmed.strip_prefix("name:") {
            if needle.is_empty() {
                return Err("device name filter must not be empty".to_string());
            }
            return Ok(Self::NameContains(needle.to_string()));
        }
        if let Ok(index) = trimmed.parse::<usize>() {
            return Ok(Self::Index(index));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "auto" | "default" | "prefer-gpu" => Ok(Self::PreferGpu),
            "first" | "any" => Ok(Self::FirstAvailable),
            "gpu" => Ok(Self::Kind(DeviceKind::Gpu)),
            "cpu" => Ok(Self::Kind(DeviceKind::Cpu)),
            "accelerator" | "accel" => Ok(Self::Kind(DeviceKind::Accelerator)),
            other => Err(format!(
                "unknown device selector '{other}'. Expected auto, first, gpu, cpu, \
                 accelerator, an index, or name:<substring>"
            )),
        }
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreferGpu => write!(f, "auto"),
            Self::FirstAvailable => write!(f, "first"),
            Self::Index(i) => write!(f, "{i}"),
            Self::NameContains(needle) => write!(f, "name:{needle}"),
            Self::Kind(DeviceKind::Gpu) => write!(f, "gpu"),
            Self::Kind(DeviceKind::Cpu) => write!(f, "cpu"),
            Self::Kind(DeviceKind::Accelerator) => write!(f, "accelerator"),
            Self::Kind(DeviceKind::Other) => write!(f, "other"),
        }
    }
}

/// Enumerate every device on every platform without creating a context.
pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    let devices = backend::enumerate_devices().map_err(KernelTestError::device_unavailable)?;
    for device in &devices {
        debug!(%device, "found OpenCL device");
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(index: usize, name: &str, kind: DeviceKind) -> DeviceInfo {
        DeviceInfo {
            index,
            name: name.to_string(),
            vendor: "Test".to_string(),
            version: "OpenCL 3.0".to_string(),
            kind,
            compute_units: 8,
            max_work_group_size: 256,
            global_mem_bytes: 1 << 30,
            supports_fp64: false,
        }
    }

    fn fleet() -> Vec<DeviceInfo> {
        vec![
            device(0, "Intel(R) Core(TM) i7", DeviceKind::Cpu),
            device(1, "Intel(R) Arc(TM) A770 Graphics", DeviceKind::Gpu),
            device(2, "FPGA Emulator", DeviceKind::Accelerator),
        ]
    }

    // ── Selection ───────────────────────────────────────────────────

    #[test]
    fn prefer_gpu_skips_cpu() {
        let devices = fleet();
        assert_eq!(DeviceSelector::PreferGpu.select(&devices).map(|d| d.index), Some(1));
    }

    #[test]
    fn prefer_gpu_falls_back_to_first() {
        let devices = vec![device(0, "pocl", DeviceKind::Cpu)];
        assert_eq!(DeviceSelector::PreferGpu.select(&devices).map(|d| d.index), Some(0));
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let devices = fleet();
        let selected = DeviceSelector::NameContains("ARC".into()).select(&devices);
        assert_eq!(selected.map(|d| d.index), Some(1));
    }

    #[test]
    fn index_and_kind_selectors() {
        let devices = fleet();
        assert_eq!(DeviceSelector::Index(2).select(&devices).map(|d| d.index), Some(2));
        assert!(DeviceSelector::Index(7).select(&devices).is_none());
        assert_eq!(
            DeviceSelector::Kind(DeviceKind::Cpu).select(&devices).map(|d| d.index),
            Some(0)
        );
        assert_eq!(DeviceSelector::FirstAvailable.select(&devices).map(|d| d.index), Some(0));
    }

    #[test]
    fn empty_fleet_selects_nothing() {
        assert!(DeviceSelector::PreferGpu.select(&[]).is_none());
    }

    // ── Parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_selectors() {
        assert_eq!("auto".parse::<DeviceSelector>().unwrap(), DeviceSelector::PreferGpu);
        assert_eq!("first".parse::<DeviceSelector>().unwrap(), DeviceSelector::FirstAvailable);
        assert_eq!("0".parse::<DeviceSelector>().unwrap(), DeviceSelector::Index(0));
        assert_eq!(
            "name:arc".parse::<DeviceSelector>().unwrap(),
            DeviceSelector::NameContains("arc".into())
        );
        assert_eq!("CPU".parse::<DeviceSelector>().unwrap(), DeviceSelector::Kind(DeviceKind::Cpu));
        assert_eq!("gpu".parse::<DeviceSelector>().unwrap(), DeviceSelector::Kind(DeviceKind::Gpu));
        assert!("name:".parse::<DeviceSelector>().is_err());
        assert!("tpu".parse::<DeviceSelector>().is_err());
    }

    #[test]
    fn display_roundtrips() {
        for selector in [
            DeviceSelector::PreferGpu,
            DeviceSelector::FirstAvailable,
            DeviceSelector::Index(3),
            DeviceSelector::NameContains("Arc".into()),
            DeviceSelector::Kind(DeviceKind::Accelerator),
        ] {
            assert_eq!(selector.to_string().parse::<DeviceSelector>().unwrap(), selector);
        }
    }

    #[test]
    fn device_display_is_one_line() {
        let shown = device(1, "Arc", DeviceKind::Gpu).to_string();
        assert!(shown.starts_with("[1] Arc (Test, GPU"), "{shown}");
        assert!(!shown.contains('\n'));
    }

    // ── Discovery ───────────────────────────────────────────────────

    #[test]
    fn list_devices_graceful_without_runtime() {
        match list_devices() {
            Ok(devices) => {
                for (i, d) in devices.iter().enumerate() {
                    assert_eq!(d.index, i);
                }
            }
            Err(e) => assert!(matches!(e, KernelTestError::DeviceUnavailable { .. })),
        }
    }
}
