use std::path::PathBuf;
use tracing::debug;

use crate::error::{LaunchError, LaunchResult};
use crate::types::DriveDescriptor;

const READ_WRITE_SUFFIX: &str = "rw";
const READ_ONLY_SUFFIX: &str = "ro";

/// Parse `path:ro|rw` drive specifications.
///
/// The returned descriptors have no id yet; ids are handed out by the block
/// device resolver once the root drive is known. Each path must exist, and a
/// missing path surfaces the OS error untouched.
pub fn parse_block_devices<S: AsRef<str>>(specs: &[S]) -> LaunchResult<Vec<DriveDescriptor>> {
    let mut drives = Vec::with_capacity(specs.len());

    for spec in specs {
        let (path, read_only) = split_drive_spec(spec.as_ref())?;
        std::fs::metadata(path)?;

        debug!("Parsed drive spec {} (read_only={})", path, read_only);
        drives.push(DriveDescriptor {
            id: String::new(),
            source_path: PathBuf::from(path),
            read_only,
            is_root: false,
            partition_uuid: None,
        });
    }

    Ok(drives)
}

fn split_drive_spec(spec: &str) -> LaunchResult<(&str, bool)> {
    let (path, suffix) = spec.rsplit_once(':').ok_or(LaunchError::NoSuffix)?;

    let read_only = match suffix {
        READ_ONLY_SUFFIX => true,
        READ_WRITE_SUFFIX => false,
        _ => return Err(LaunchError::NoSuffix),
    };

    if path.is_empty() {
        return Err(LaunchError::NoPath);
    }

    Ok((path, read_only))
}
