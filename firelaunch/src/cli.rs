use clap::Parser;
use std::path::{Path, PathBuf};

use firelaunch_core::{LaunchError, LaunchResult, Options};

#[derive(Parser, Debug)]
#[command(name = "firelaunch")]
#[command(about = "Resolve microVM launch options for a Firecracker-style VMM", long_about = None)]
pub struct Cli {
    /// TOML file providing option values; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to the VMM API socket
    #[arg(long)]
    pub socket_path: Option<PathBuf>,

    /// Path to the kernel image
    #[arg(long)]
    pub kernel: Option<PathBuf>,

    /// Kernel command line
    #[arg(long)]
    pub kernel_opts: Option<String>,

    /// Path to the root disk image
    #[arg(long)]
    pub root_drive: Option<PathBuf>,

    /// Root partition UUID
    #[arg(long)]
    pub root_partition: Option<String>,

    /// Additional drive as PATH:ro or PATH:rw, may be repeated
    #[arg(long = "add-drive")]
    pub additional_drives: Vec<String>,

    /// NIC as DEVICE/MACADDR
    #[arg(long = "tap-device")]
    pub nic_config: Option<String>,

    /// Vsock device as PATH:CID, may be repeated
    #[arg(long = "vsock-device")]
    pub vsock_devices: Vec<String>,

    /// Named pipe the VMM writes its log into
    #[arg(long = "vmm-log-fifo")]
    pub log_fifo: Option<PathBuf>,

    /// VMM log level
    #[arg(long)]
    pub log_level: Option<String>,

    /// Named pipe the VMM writes its metrics into
    #[arg(long)]
    pub metrics_fifo: Option<PathBuf>,

    /// File the VMM log is forwarded into
    #[arg(long = "firecracker-log")]
    pub fifo_log_file: Option<PathBuf>,

    /// Number of vCPUs
    #[arg(long = "ncpus")]
    pub vcpu_count: Option<u32>,

    /// Guest memory in MiB
    #[arg(long = "memory")]
    pub mem_size_mib: Option<u32>,

    /// CPU template (C3 or T2)
    #[arg(long)]
    pub cpu_template: Option<String>,

    /// Disable CPU hyperthreading
    #[arg(long)]
    pub disable_hyperthreading: bool,

    /// JSON metadata served to the guest
    #[arg(long)]
    pub metadata: Option<String>,

    /// Create the pipes and keep forwarding the VMM log until interrupted.
    /// Without it, generated fifo paths in the printed config are removed
    /// before exit and are only valid while holding
    #[arg(long)]
    pub hold: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// Build options from the config file (if any), then apply flags on top.
    pub fn into_options(self) -> LaunchResult<Options> {
        let mut opts = match &self.config {
            Some(path) => load_options(path)?,
            None => Options::default(),
        };

        override_with(&mut opts.socket_path, self.socket_path);
        override_with(&mut opts.root_drive_path, self.root_drive);
        override_with(&mut opts.root_partition_uuid, self.root_partition);
        override_with(&mut opts.nic_config, self.nic_config);
        override_with(&mut opts.log_fifo, self.log_fifo);
        override_with(&mut opts.metrics_fifo, self.metrics_fifo);
        override_with(&mut opts.fifo_log_file, self.fifo_log_file);
        override_with(&mut opts.cpu_template, self.cpu_template);
        override_with(&mut opts.metadata, self.metadata);

        if let Some(kernel) = self.kernel {
            opts.kernel_image = kernel;
        }
        if let Some(kernel_opts) = self.kernel_opts {
            opts.kernel_args = kernel_opts;
        }
        if let Some(log_level) = self.log_level {
            opts.log_level = log_level;
        }
        if let Some(vcpu_count) = self.vcpu_count {
            opts.vcpu_count = vcpu_count;
        }
        if let Some(mem_size_mib) = self.mem_size_mib {
            opts.mem_size_mib = mem_size_mib;
        }
        if !self.additional_drives.is_empty() {
            opts.additional_drives = self.additional_drives;
        }
        if !self.vsock_devices.is_empty() {
            opts.vsock_devices = self.vsock_devices;
        }
        opts.disable_hyperthreading |= self.disable_hyperthreading;
        opts.debug |= self.debug;

        Ok(opts)
    }
}

fn override_with<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

/// Load options from a TOML file; missing keys keep their defaults.
pub fn load_options(path: &Path) -> LaunchResult<Options> {
    let contents = std::fs::read_to_string(path).map_err(|e| LaunchError::ConfigFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    toml::from_str(&contents).map_err(|e| LaunchError::ConfigFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "vcpu_count = 4\nmem_size_mib = 2048\nnic_config = \"tap0/aa\"\nadditional_drives = [\"/a:ro\"]"
        )
        .unwrap();

        let cli = Cli::parse_from([
            "firelaunch",
            "--config",
            file.path().to_str().unwrap(),
            "--ncpus",
            "8",
            "--tap-device",
            "tap1/bb",
        ]);
        let opts = cli.into_options().unwrap();

        assert_eq!(opts.vcpu_count, 8);
        assert_eq!(opts.mem_size_mib, 2048);
        assert_eq!(opts.nic_config.as_deref(), Some("tap1/bb"));
        assert_eq!(opts.additional_drives, vec!["/a:ro".to_string()]);
    }

    #[test]
    fn test_bad_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "vcpu_count = \"many\"").unwrap();

        let err = load_options(file.path()).unwrap_err();
        assert!(matches!(err, LaunchError::ConfigFile { .. }));
    }

    #[test]
    fn test_repeated_flags() {
        let cli = Cli::parse_from([
            "firelaunch",
            "--add-drive",
            "/a:ro",
            "--add-drive",
            "/b:rw",
            "--vsock-device",
            "/v:3",
        ]);
        let opts = cli.into_options().unwrap();

        assert_eq!(opts.additional_drives.len(), 2);
        assert_eq!(opts.vsock_devices, vec!["/v:3".to_string()]);
    }
}
