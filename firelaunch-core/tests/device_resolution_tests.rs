use firelaunch_core::{DriveDescriptor, LaunchError, NicDescriptor, Options, VsockDescriptor};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use test_case::test_case;

#[test]
fn test_invalid_additional_drive() {
    let opts = Options {
        additional_drives: vec!["ab".to_string()],
        ..Options::default()
    };

    assert!(matches!(opts.get_block_devices(), Err(LaunchError::NoSuffix)));
}

#[test]
fn test_additional_drive_with_root_drive() {
    let file = NamedTempFile::new().unwrap();
    let opts = Options {
        additional_drives: vec![format!("{}:ro", file.path().display())],
        root_drive_path: Some(file.path().to_path_buf()),
        root_partition_uuid: Some("UUID".to_string()),
        ..Options::default()
    };

    let drives = opts.get_block_devices().unwrap();
    assert_eq!(
        drives,
        vec![
            DriveDescriptor {
                id: "2".to_string(),
                source_path: file.path().to_path_buf(),
                read_only: true,
                is_root: false,
                partition_uuid: None,
            },
            DriveDescriptor {
                id: "1".to_string(),
                source_path: file.path().to_path_buf(),
                read_only: false,
                is_root: true,
                partition_uuid: Some("UUID".to_string()),
            },
        ]
    );
}

#[test]
fn test_drive_ids_follow_input_order() {
    let files: Vec<NamedTempFile> = (0..3).map(|_| NamedTempFile::new().unwrap()).collect();
    let opts = Options {
        additional_drives: files
            .iter()
            .map(|f| format!("{}:rw", f.path().display()))
            .collect(),
        ..Options::default()
    };

    let drives = opts.get_block_devices().unwrap();
    let ids: Vec<&str> = drives.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "3", "4"]);
    for (drive, file) in drives.iter().zip(&files) {
        assert_eq!(drive.source_path, file.path());
        assert!(!drive.is_root);
    }
}

#[test]
fn test_root_drive_only() {
    let opts = Options {
        root_drive_path: Some("/images/rootfs.ext4".into()),
        ..Options::default()
    };

    let drives = opts.get_block_devices().unwrap();
    assert_eq!(drives.len(), 1);
    assert_eq!(drives[0].id, "1");
    assert!(drives[0].is_root);
    assert_eq!(drives[0].partition_uuid, None);
}

#[test]
fn test_no_nic_config() {
    let opts = Options::default();
    assert_eq!(opts.get_network().unwrap(), None);
}

#[test]
fn test_invalid_nic_config() {
    let opts = Options {
        nic_config: Some("invalid".to_string()),
        ..Options::default()
    };
    assert!(matches!(opts.get_network(), Err(LaunchError::NicConfigFormat)));
}

#[test_case(Some("42"), true ; "metadata set")]
#[test_case(None, false ; "metadata unset")]
fn test_valid_nic_config(metadata: Option<&str>, allow_mmds: bool) {
    let mut opts = Options {
        nic_config: Some("valid/things".to_string()),
        metadata: metadata.map(str::to_string),
        ..Options::default()
    };
    opts.resolve_metadata().unwrap();

    assert_eq!(
        opts.get_network().unwrap(),
        Some(vec![NicDescriptor {
            host_device: "valid".to_string(),
            mac_address: "things".to_string(),
            allow_mmds,
        }])
    );
}

#[test]
fn test_invalid_metadata() {
    let mut opts = Options {
        metadata: Some("{not json".to_string()),
        ..Options::default()
    };
    assert!(matches!(opts.resolve_metadata(), Err(LaunchError::InvalidMetadata(_))));
}

#[test]
fn test_vsock_devices() {
    let opts = Options {
        vsock_devices: vec!["/tmp/v.sock:3".to_string(), "/tmp/w.sock:4".to_string()],
        ..Options::default()
    };

    assert_eq!(
        opts.get_vsocks().unwrap(),
        vec![
            VsockDescriptor {
                path: "/tmp/v.sock".to_string(),
                context_id: 3,
            },
            VsockDescriptor {
                path: "/tmp/w.sock".to_string(),
                context_id: 4,
            },
        ]
    );

    let broken = Options {
        vsock_devices: vec!["/tmp/v.sock:3".to_string(), "a:b".to_string()],
        ..Options::default()
    };
    assert!(matches!(broken.get_vsocks(), Err(LaunchError::InvalidVsockCid)));
}
