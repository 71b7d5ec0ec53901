//! Launcher options and the resolvers that turn them into VMM configuration
//!
//! [`Options`] carries the raw, user-facing values: spec strings, paths and
//! machine sizing. The resolvers validate those values and assemble the
//! structured [`MachineConfig`] handed to the VMM.
//!
//! Resolution may create files, directories and pipes. They stay owned by the
//! options value until [`Options::close`] runs (or the value is dropped), so
//! callers can always clean up no matter how far resolution got.

use rand::Rng;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{constants, LaunchDefaults};
use crate::error::{LaunchError, LaunchResult};
use crate::fifo::FifoResources;
use crate::spec::{parse_block_devices, parse_nic_config, parse_vsocks};
use crate::types::{
    DriveDescriptor, MachineConfig, MachineSizing, NicDescriptor, VsockDescriptor,
};

/// Id reserved for the root drive
const ROOT_DRIVE_ID: &str = "1";

/// Id handed to the first additional drive
const FIRST_ADDITIONAL_DRIVE_ID: usize = 2;

/// Raw launcher options, as collected from the CLI or a TOML file
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Options {
    /// VMM API socket; generated when unset
    pub socket_path: Option<PathBuf>,
    pub kernel_image: PathBuf,
    pub kernel_args: String,
    pub root_drive_path: Option<PathBuf>,
    pub root_partition_uuid: Option<String>,
    /// Extra drives as `path:ro` or `path:rw`
    pub additional_drives: Vec<String>,
    /// Network interface as `device/mac`
    pub nic_config: Option<String>,
    /// Vsock devices as `path:cid`
    pub vsock_devices: Vec<String>,
    pub log_fifo: Option<PathBuf>,
    pub log_level: String,
    pub metrics_fifo: Option<PathBuf>,
    /// File the log pipe is forwarded into; excludes `log_fifo`
    pub fifo_log_file: Option<PathBuf>,
    pub vcpu_count: u32,
    pub mem_size_mib: u32,
    pub cpu_template: Option<String>,
    pub disable_hyperthreading: bool,
    /// JSON document served to the guest through the metadata service
    pub metadata: Option<String>,
    pub debug: bool,

    /// Parsed `metadata`, filled in by [`Options::resolve_metadata`]
    #[serde(skip)]
    pub valid_metadata: Option<serde_json::Value>,
    /// Files, directories and pipes created during resolution
    #[serde(skip)]
    pub resources: FifoResources,
}

impl Default for Options {
    fn default() -> Self {
        let defaults = LaunchDefaults::default();
        Self {
            socket_path: None,
            kernel_image: PathBuf::from(defaults.kernel_image),
            kernel_args: defaults.kernel_args,
            root_drive_path: None,
            root_partition_uuid: None,
            additional_drives: Vec::new(),
            nic_config: None,
            vsock_devices: Vec::new(),
            log_fifo: None,
            log_level: defaults.log_level,
            metrics_fifo: None,
            fifo_log_file: None,
            vcpu_count: defaults.vcpu_count,
            mem_size_mib: defaults.mem_size_mib,
            cpu_template: None,
            disable_hyperthreading: false,
            metadata: None,
            debug: false,
            valid_metadata: None,
            resources: FifoResources::default(),
        }
    }
}

/// Resolved configuration plus the log writer fed by the log pipe
#[derive(Debug)]
pub struct LaunchPlan {
    pub config: MachineConfig,
    pub log_writer: Option<File>,
}

impl Options {
    /// Build the network interface list.
    ///
    /// Networking is optional: with no NIC configured this returns `Ok(None)`.
    pub fn get_network(&self) -> LaunchResult<Option<Vec<NicDescriptor>>> {
        let Some(spec) = self.nic_config.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let (host_device, mac_address) = parse_nic_config(spec)?;
        Ok(Some(vec![NicDescriptor {
            host_device,
            mac_address,
            allow_mmds: self.valid_metadata.is_some(),
        }]))
    }

    /// Build the drive list: additional drives first, numbered from "2" in
    /// input order, then the root drive as "1" when one is configured.
    pub fn get_block_devices(&self) -> LaunchResult<Vec<DriveDescriptor>> {
        let mut drives = parse_block_devices(&self.additional_drives)?;
        for (index, drive) in drives.iter_mut().enumerate() {
            drive.id = (index + FIRST_ADDITIONAL_DRIVE_ID).to_string();
        }

        if let Some(root) = non_empty(&self.root_drive_path) {
            drives.push(DriveDescriptor {
                id: ROOT_DRIVE_ID.to_string(),
                source_path: root.to_path_buf(),
                read_only: false,
                is_root: true,
                partition_uuid: self.root_partition_uuid.clone().filter(|u| !u.is_empty()),
            });
        }

        debug!("Resolved {} drive(s)", drives.len());
        Ok(drives)
    }

    pub fn get_vsocks(&self) -> LaunchResult<Vec<VsockDescriptor>> {
        parse_vsocks(&self.vsock_devices)
    }

    /// Parse the metadata document, if any, enabling the metadata service.
    pub fn resolve_metadata(&mut self) -> LaunchResult<()> {
        self.valid_metadata = match self.metadata.as_deref().filter(|m| !m.is_empty()) {
            Some(raw) => Some(serde_json::from_str(raw).map_err(LaunchError::InvalidMetadata)?),
            None => None,
        };
        Ok(())
    }

    /// Resolve every option into the configuration handed to the VMM.
    ///
    /// Resources created along the way remain registered with `self` even
    /// when a later step fails.
    pub fn machine_config(&mut self) -> LaunchResult<LaunchPlan> {
        self.validate_sizing()?;
        self.resolve_metadata()?;
        let log_writer = self.resolve_fifos()?;

        let drives = self.get_block_devices()?;
        let network_interfaces = self.get_network()?.unwrap_or_default();
        let vsock_devices = self.get_vsocks()?;

        let socket_path = match non_empty(&self.socket_path) {
            Some(path) => path.to_path_buf(),
            None => generate_socket_path(),
        };
        info!("Resolved machine configuration, API socket {}", socket_path.display());

        let config = MachineConfig {
            socket_path,
            log_fifo: self.log_fifo.clone(),
            metrics_fifo: self.metrics_fifo.clone(),
            log_level: self.log_level.clone(),
            kernel_image_path: self.kernel_image.clone(),
            kernel_args: self.kernel_args.clone(),
            drives,
            network_interfaces,
            vsock_devices,
            machine: MachineSizing {
                vcpu_count: self.vcpu_count,
                mem_size_mib: self.mem_size_mib,
                ht_enabled: !self.disable_hyperthreading,
                cpu_template: self.cpu_template.clone().filter(|t| !t.is_empty()),
            },
            metadata: self.valid_metadata.clone(),
            debug: self.debug,
        };

        Ok(LaunchPlan { config, log_writer })
    }

    fn validate_sizing(&self) -> LaunchResult<()> {
        if self.vcpu_count == 0 {
            return Err(LaunchError::InvalidConfiguration {
                message: "vcpu count must be at least 1".to_string(),
            });
        }
        if self.mem_size_mib == 0 {
            return Err(LaunchError::InvalidConfiguration {
                message: "memory size must be at least 1 MiB".to_string(),
            });
        }
        Ok(())
    }
}

/// Treat an empty path the same as an unset one.
pub(crate) fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

/// `$HOME/.firecracker.sock-<pid>-<n>`, falling back to the temp dir.
fn generate_socket_path() -> PathBuf {
    let dir = std::env::var_os("HOME")
        .map(PathBuf::from)
        .filter(|home| home.is_dir())
        .unwrap_or_else(std::env::temp_dir);

    let suffix = rand::thread_rng().gen_range(0..constants::SOCKET_RANDOM_RANGE);
    dir.join(format!(
        "{}-{}-{}",
        constants::SOCKET_FILE_PREFIX,
        std::process::id(),
        suffix
    ))
}
