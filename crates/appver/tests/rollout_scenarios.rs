// SPDX-License-Identifier: CC-BY-NC-ND-4.0

//! End-to-end rollout scenarios through the version manager

use appver::{RolloutStage, RolloutStrategy, VersionError, VersionManager};

fn phonepe() -> VersionManager {
    let manager = VersionManager::new();
    manager
        .upload_new_version("PhonePe", "v1.0", "Android-9", "v1.0 content", false)
        .unwrap();
    manager
        .upload_new_version("PhonePe", "v2.0", "Android-10", "v2.0 content", false)
        .unwrap();
    manager
}

#[test]
fn test_update_then_beta_rollout() {
    let manager = phonepe();

    assert_eq!(
        manager.check_for_updates("PhonePe", "v1.0", "Android-10"),
        Some("v2.0".to_owned())
    );

    let report = manager
        .release_version("PhonePe", "v2.0", "beta", 0, &["d1", "d2"])
        .unwrap();
    assert_eq!(report.strategy, RolloutStrategy::Beta);
    assert_eq!(manager.assignment("d1"), Some("v2.0".to_owned()));
    assert_eq!(manager.assignment("d2"), Some("v2.0".to_owned()));

    let before = manager.assignments();
    let err = manager
        .release_version("unknown-app", "v2.0", "beta", 0, &["d3"])
        .unwrap_err();
    assert!(matches!(err, VersionError::AppNotFound(_)));
    assert_eq!(manager.assignments(), before);
}

#[test]
fn test_percentage_then_beta_like_demo() {
    let manager = phonepe();
    let devices: Vec<String> = (1..=8).map(|i| format!("device{i}")).collect();

    let report = manager
        .release_version("PhonePe", "v2.0", "percentage", 50, &devices)
        .unwrap();
    assert_eq!(report.requested, 8);
    assert_eq!(report.target, 4);
    assert_eq!(report.released, vec!["device1", "device4", "device5", "device7"]);

    manager
        .release_version("PhonePe", "v2.0", "beta", 0, &["device1", "device2"])
        .unwrap();

    // device1 appears twice: once per rollout
    let record = manager.get_version("PhonePe", "v2.0").unwrap();
    assert_eq!(
        record.released_devices,
        vec!["device1", "device4", "device5", "device7", "device1", "device2"]
    );
    assert_eq!(
        manager.rollout_stage("PhonePe", "v2.0").unwrap(),
        RolloutStage::PartiallyReleased { devices: 6 }
    );

    let assignments = manager.assignments();
    assert_eq!(assignments.len(), 5);
    assert!(assignments.values().all(|v| v == "v2.0"));
    assert!(!assignments.contains_key("device3"));
}

#[test]
fn test_every_released_device_has_an_assignment() {
    let manager = phonepe();
    let devices: Vec<String> = (0..64).map(|i| format!("handset-{i:03}")).collect();

    manager
        .release_version("PhonePe", "v1.0", "percentage", 40, &devices)
        .unwrap();
    manager
        .release_version("PhonePe", "v2.0", "percentage", 20, &devices)
        .unwrap();

    for version in ["v1.0", "v2.0"] {
        let record = manager.get_version("PhonePe", version).unwrap();
        for device in &record.released_devices {
            assert!(manager.assignment(device).is_some());
        }
    }
}

#[test]
fn test_sampler_cohort_is_stable_across_managers() {
    let devices: Vec<String> = (0..50).map(|i| format!("device-{i}")).collect();

    let first = phonepe()
        .release_version("PhonePe", "v2.0", "percentage", 30, &devices)
        .unwrap();
    let second = phonepe()
        .release_version("PhonePe", "v2.0", "percentage", 30, &devices)
        .unwrap();

    assert_eq!(first.released, second.released);
    assert!(first.released.len() <= 15);
}

#[test]
fn test_upload_never_drops_other_versions() {
    let manager = phonepe();
    manager
        .upload_new_version("PhonePe", "v3.0", "Android-12", "v3.0 content", true)
        .unwrap();
    manager
        .upload_new_version("PhonePe", "v1.0", "Android-9", "v1.0 rebuilt", false)
        .unwrap();

    let mut ids: Vec<String> = manager
        .list_versions("PhonePe")
        .into_iter()
        .map(|v| v.version_id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["v1.0", "v2.0", "v3.0"]);
    assert_eq!(
        manager.get_version("PhonePe", "v1.0").unwrap().content,
        b"v1.0 rebuilt"
    );
}
