use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A block device ready to be attached to the microVM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriveDescriptor {
    #[serde(rename = "drive_id")]
    pub id: String,
    #[serde(rename = "path_on_host")]
    pub source_path: PathBuf,
    #[serde(rename = "is_read_only")]
    pub read_only: bool,
    #[serde(rename = "is_root_device")]
    pub is_root: bool,
    #[serde(rename = "partuuid", skip_serializing_if = "Option::is_none")]
    pub partition_uuid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NicDescriptor {
    #[serde(rename = "host_dev_name")]
    pub host_device: String,
    #[serde(rename = "guest_mac")]
    pub mac_address: String,
    /// Lets the guest reach the metadata service through this interface
    pub allow_mmds: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VsockDescriptor {
    #[serde(rename = "uds_path")]
    pub path: String,
    #[serde(rename = "guest_cid")]
    pub context_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineSizing {
    pub vcpu_count: u32,
    pub mem_size_mib: u32,
    pub ht_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_template: Option<String>,
}

/// Everything the VMM needs to boot one microVM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineConfig {
    pub socket_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_fifo: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_fifo: Option<PathBuf>,
    pub log_level: String,
    pub kernel_image_path: PathBuf,
    pub kernel_args: String,
    pub drives: Vec<DriveDescriptor>,
    pub network_interfaces: Vec<NicDescriptor>,
    pub vsock_devices: Vec<VsockDescriptor>,
    pub machine: MachineSizing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub debug: bool,
}
