//! Launch geometry: the global invocation grid and the work-group shape.

use crate::error::{KernelTestError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Most devices expose at most three work-item dimensions.
pub const MAX_DIMENSIONS: usize = 3;

/// Work-group size of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalSize {
    /// Let the runtime choose the work-group size.
    #[default]
    Auto,
    /// Explicit work-group size, one entry per dimension.
    Explicit(Vec<usize>),
}

impl FromStr for LocalSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::Auto);
        }
        parse_sizes(trimmed).map(Self::Explicit)
    }
}

impl fmt::Display for LocalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Explicit(sizes) => f.write_str(&join_sizes(sizes)),
        }
    }
}

/// Parse `"1024"`, `"32,32"` or `"(16, 16, 1)"` into a list of sizes.
pub fn parse_sizes(s: &str) -> std::result::Result<Vec<usize>, String> {
    let inner = s.trim().trim_start_matches('(').trim_end_matches(')');
    let sizes = inner
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<usize>().map_err(|e| format!("invalid size '{part}': {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if sizes.is_empty() {
        return Err(format!("no sizes in '{s}'"));
    }
    Ok(sizes)
}

fn join_sizes(sizes: &[usize]) -> String {
    sizes.iter().map(usize::to_string).collect::<Vec<_>>().join(",")
}

/// Validated launch geometry.
///
/// Invariants, checked by [`LaunchGeometry::new`]:
/// - 1 to [`MAX_DIMENSIONS`] dimensions, every size positive;
/// - an explicit local size has the same arity as the global size and divides
///   it element-wise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchGeometry {
    global: Vec<usize>,
    local: LocalSize,
}

impl LaunchGeometry {
    pub fn new(global: Vec<usize>, local: LocalSize) -> Result<Self> {
        if global.is_empty() || global.len() > MAX_DIMENSIONS {
            return Err(KernelTestError::work_group(
                None,
                format!("global size must have 1 to {MAX_DIMENSIONS} dimensions, got {}", global.len()),
            ));
        }
        if let Some(dim) = global.iter().position(|&g| g == 0) {
            return Err(KernelTestError::work_group(Some(dim), "global size must be positive"));
        }

        if let LocalSize::Explicit(local_sizes) = &local {
            if local_sizes.len() != global.len() {
                return Err(KernelTestError::work_group(
                    None,
                    format!(
                        "local size ({}) has {} dimensions but global size ({}) has {}",
                        join_sizes(local_sizes),
                        local_sizes.len(),
                        join_sizes(&global),
                        global.len()
                    ),
                ));
            }
            for (dim, (&g, &l)) in global.iter().zip(local_sizes).enumerate() {
                if l == 0 {
                    return Err(KernelTestError::work_group(Some(dim), "local size must be positive"));
                }
                if g % l != 0 {
                    return Err(KernelTestError::work_group(
                        Some(dim),
                        format!("global size {g} is not divisible by local size {l}"),
                    ));
                }
            }
        }

        Ok(Self { global, local })
    }

    /// A one-dimensional grid of `n` invocations with a runtime-chosen
    /// work-group size.
    pub fn linear(n: usize) -> Result<Self> {
        Self::new(vec![n], LocalSize::Auto)
    }

    pub fn global(&self) -> &[usize] {
        &self.global
    }

    /// Explicit work-group sizes, or `None` when the runtime chooses.
    pub fn local(&self) -> Option<&[usize]> {
        match &self.local {
            LocalSize::Auto => None,
            LocalSize::Explicit(sizes) => Some(sizes),
        }
    }

    pub fn local_size(&self) -> &LocalSize {
        &self.local
    }

    pub fn dimensions(&self) -> usize {
        self.global.len()
    }

    /// Total number of work items.
    pub fn total_work_items(&self) -> usize {
        self.global.iter().product()
    }

    /// Work items per work-group, when explicit.
    pub fn work_group_items(&self) -> Option<usize> {
        self.local().map(|l| l.iter().product())
    }
}

impl fmt::Display for LaunchGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "global=({}) local=({})", join_sizes(&self.global), self.local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explicit(sizes: &[usize]) -> LocalSize {
        LocalSize::Explicit(sizes.to_vec())
    }

    // ── Divisibility ────────────────────────────────────────────────

    #[test]
    fn indivisible_local_size_rejected() {
        let err = LaunchGeometry::new(vec![10], explicit(&[3])).unwrap_err();
        match err {
            KernelTestError::InvalidWorkGroupSize { dimension, reason } => {
                assert_eq!(dimension, Some(0));
                assert!(reason.contains("10") && reason.contains('3'), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn divisible_local_size_accepted() {
        let geometry = LaunchGeometry::new(vec![10], explicit(&[5])).unwrap();
        assert_eq!(geometry.global(), &[10usize][..]);
        assert_eq!(geometry.local(), Some(&[5][..]));
        assert_eq!(geometry.work_group_items(), Some(5));
    }

    #[test]
    fn second_dimension_reported() {
        let err = LaunchGeometry::new(vec![8, 9], explicit(&[4, 2])).unwrap_err();
        assert!(matches!(err, KernelTestError::InvalidWorkGroupSize { dimension: Some(1), .. }));
    }

    // ── Shape checks ────────────────────────────────────────────────

    #[test]
    fn auto_local_accepts_any_global() {
        let geometry = LaunchGeometry::new(vec![7, 3], LocalSize::Auto).unwrap();
        assert_eq!(geometry.local(), None);
        assert_eq!(geometry.total_work_items(), 21);
    }

    #[test]
    fn arity_mismatch_rejected() {
        let err = LaunchGeometry::new(vec![8, 8], explicit(&[4])).unwrap_err();
        assert!(matches!(err, KernelTestError::InvalidWorkGroupSize { dimension: None, .. }));
    }

    #[test]
    fn zero_sizes_rejected() {
        assert!(LaunchGeometry::new(vec![0], LocalSize::Auto).is_err());
        assert!(LaunchGeometry::new(vec![4], explicit(&[0])).is_err());
    }

    #[test]
    fn dimension_count_bounded() {
        assert!(LaunchGeometry::new(Vec::new(), LocalSize::Auto).is_err());
        assert!(LaunchGeometry::new(vec![1, 1, 1, 1], LocalSize::Auto).is_err());
        assert!(LaunchGeometry::new(vec![2, 2, 2], explicit(&[1, 1, 2])).is_ok());
    }

    // ── Parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_local_size_forms() {
        assert_eq!("auto".parse::<LocalSize>().unwrap(), LocalSize::Auto);
        assert_eq!("None".parse::<LocalSize>().unwrap(), LocalSize::Auto);
        assert_eq!("16".parse::<LocalSize>().unwrap(), explicit(&[16]));
        assert_eq!("(1, )".parse::<LocalSize>().unwrap(), explicit(&[1]));
        assert_eq!("8,8".parse::<LocalSize>().unwrap(), explicit(&[8, 8]));
        assert!("eight".parse::<LocalSize>().is_err());
        assert!("()".parse::<LocalSize>().is_err());
    }

    #[test]
    fn display_is_compact() {
        let geometry = LaunchGeometry::new(vec![64, 2], explicit(&[16, 1])).unwrap();
        assert_eq!(geometry.to_string(), "global=(64,2) local=(16,1)");
        assert_eq!(LaunchGeometry::linear(5).unwrap().to_string(), "global=(5) local=(auto)");
    }
}
