use crate::error::{LaunchError, LaunchResult};

/// Split a `device/mac` NIC specification into its two halves.
///
/// Every malformed input yields the same [`LaunchError::NicConfigFormat`].
pub fn parse_nic_config(spec: &str) -> LaunchResult<(String, String)> {
    let mut fields = spec.split('/');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(device), Some(mac), None) if !device.is_empty() && !mac.is_empty() => {
            Ok((device.to_string(), mac.to_string()))
        }
        _ => Err(LaunchError::NicConfigFormat),
    }
}
