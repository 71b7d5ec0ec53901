pub mod config;
pub mod error;
pub mod fifo;
pub mod options;
pub mod spec;
pub mod types;

pub use error::{LaunchError, LaunchResult};
pub use fifo::{Closer, FifoForwarder, FifoResources};
pub use options::{LaunchPlan, Options};
pub use spec::{parse_block_devices, parse_nic_config, parse_vsocks};

// Re-export descriptor types for convenience
pub use types::*;
