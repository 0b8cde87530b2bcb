//! Compute-backend capability probe.
//!
//! Pure query against the host environment: a backend counts as usable when
//! its runtime libraries are reachable from `PATH` or the current directory.
//! The result is advisory — it is surfaced to the host so the settings UI
//! only offers backends that can actually run.

use std::path::PathBuf;

const CUDA_LIBS: [&str; 2] = ["cudart64_12.dll", "cublas64_12.dll"];
const VULKAN_LIB: &str = "vulkan-1.dll";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub cpu: bool,
    pub cuda: bool,
    pub vulkan: bool,
}

impl Capability {
    /// Bitmask for the FFI: bit 0 cpu, bit 1 cuda, bit 2 vulkan.
    pub fn bits(&self) -> u32 {
        (self.cpu as u32) | (self.cuda as u32) << 1 | (self.vulkan as u32) << 2
    }
}

fn search_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    dirs
}

fn lib_present(dirs: &[PathBuf], name: &str) -> bool {
    dirs.iter().any(|dir| dir.join(name).exists())
}

/// Detect which backends are usable on this host. The baseline backend is
/// always available.
pub fn probe() -> Capability {
    let dirs = search_dirs();
    Capability {
        cpu: true,
        cuda: CUDA_LIBS.iter().all(|lib| lib_present(&dirs, lib)),
        vulkan: lib_present(&dirs, VULKAN_LIB),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_is_always_available() {
        assert!(probe().cpu);
    }

    #[test]
    fn bits_layout() {
        let all = Capability {
            cpu: true,
            cuda: true,
            vulkan: true,
        };
        assert_eq!(all.bits(), 0b111);

        let cpu_only = Capability {
            cpu: true,
            cuda: false,
            vulkan: false,
        };
        assert_eq!(cpu_only.bits(), 0b001);

        let no_cuda = Capability {
            cpu: true,
            cuda: false,
            vulkan: true,
        };
        assert_eq!(no_cuda.bits(), 0b101);
    }

    #[test]
    fn lib_present_finds_file_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vulkan-1.dll"), b"").unwrap();
        let dirs = vec![dir.path().to_path_buf()];
        assert!(lib_present(&dirs, "vulkan-1.dll"));
        assert!(!lib_present(&dirs, "cudart64_12.dll"));
    }
}
