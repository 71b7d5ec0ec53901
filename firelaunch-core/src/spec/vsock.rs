use crate::error::{LaunchError, LaunchResult};
use crate::types::VsockDescriptor;

/// Parse `path:cid` vsock specifications.
///
/// A structurally broken entry (no separator, empty path or empty CID) is
/// [`LaunchError::MalformedVsockSpec`]; a CID that is present but not a
/// base-10 `u32` is [`LaunchError::InvalidVsockCid`].
pub fn parse_vsocks<S: AsRef<str>>(specs: &[S]) -> LaunchResult<Vec<VsockDescriptor>> {
    specs.iter().map(|spec| parse_vsock(spec.as_ref())).collect()
}

fn parse_vsock(spec: &str) -> LaunchResult<VsockDescriptor> {
    let (path, cid) = spec
        .rsplit_once(':')
        .filter(|(path, cid)| !path.is_empty() && !cid.is_empty())
        .ok_or(LaunchError::MalformedVsockSpec)?;

    // str::parse tolerates a leading '+', a CID must be plain digits
    if !cid.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LaunchError::InvalidVsockCid);
    }
    let context_id = cid.parse::<u32>().map_err(|_| LaunchError::InvalidVsockCid)?;

    Ok(VsockDescriptor {
        path: path.to_string(),
        context_id,
    })
}
