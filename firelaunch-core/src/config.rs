//! Launcher defaults and environment variable overrides
//!
//! Defaults are centralised here so a deployment can change them through
//! `FIRELAUNCH_*` environment variables without touching the CLI.

use std::env;

pub mod constants {
    /// Kernel image used when none is given
    pub const DEFAULT_KERNEL_IMAGE: &str = "./vmlinux";

    /// Kernel command line used when none is given
    pub const DEFAULT_KERNEL_ARGS: &str =
        "ro console=ttyS0 noapic reboot=k panic=1 pci=off nomodules systemd.journald.forward_to_console systemd.unit=firecracker.target init=/sbin/overlay-init";

    pub const DEFAULT_LOG_LEVEL: &str = "Debug";

    pub const DEFAULT_VCPU_COUNT: u32 = 1;

    pub const DEFAULT_MEM_SIZE_MIB: u32 = 512;

    /// Prefix of the private directory holding generated pipes
    pub const FIFO_DIR_PREFIX: &str = "fcfifo";

    /// File name of a generated log pipe
    pub const LOG_FIFO_NAME: &str = "fc_fifo";

    /// File name of a generated metrics pipe
    pub const METRICS_FIFO_NAME: &str = "fc_metrics_fifo";

    /// Prefix of a generated API socket file name
    pub const SOCKET_FILE_PREFIX: &str = ".firecracker.sock";

    /// Upper bound (exclusive) of the random socket name component
    pub const SOCKET_RANDOM_RANGE: u32 = 1000;
}

/// Parse an environment variable as a typed value with a default fallback
pub fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Machine and kernel defaults, honouring environment overrides
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchDefaults {
    pub kernel_image: String,
    pub kernel_args: String,
    pub log_level: String,
    pub vcpu_count: u32,
    pub mem_size_mib: u32,
}

impl Default for LaunchDefaults {
    fn default() -> Self {
        Self {
            kernel_image: env_var_or_default(
                "FIRELAUNCH_KERNEL_IMAGE",
                constants::DEFAULT_KERNEL_IMAGE.to_string(),
            ),
            kernel_args: env_var_or_default(
                "FIRELAUNCH_KERNEL_ARGS",
                constants::DEFAULT_KERNEL_ARGS.to_string(),
            ),
            log_level: env_var_or_default(
                "FIRELAUNCH_LOG_LEVEL",
                constants::DEFAULT_LOG_LEVEL.to_string(),
            ),
            vcpu_count: env_var_or_default("FIRELAUNCH_VCPU_COUNT", constants::DEFAULT_VCPU_COUNT),
            mem_size_mib: env_var_or_default(
                "FIRELAUNCH_MEM_SIZE_MIB",
                constants::DEFAULT_MEM_SIZE_MIB,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("FIRELAUNCH_VCPU_COUNT", "4");
        let defaults = LaunchDefaults::default();
        env::remove_var("FIRELAUNCH_VCPU_COUNT");

        assert_eq!(defaults.vcpu_count, 4);
        assert_eq!(defaults.mem_size_mib, constants::DEFAULT_MEM_SIZE_MIB);
    }

    #[test]
    #[serial]
    fn test_unparseable_env_falls_back() {
        env::set_var("FIRELAUNCH_MEM_SIZE_MIB", "lots");
        let defaults = LaunchDefaults::default();
        env::remove_var("FIRELAUNCH_MEM_SIZE_MIB");

        assert_eq!(defaults.mem_size_mib, constants::DEFAULT_MEM_SIZE_MIB);
    }
}
