// Integration tests for protocol version negotiation
//
// Exercises the handshake the way both ends of a connection run it: each
// side advertises its list as header text and negotiates the other's.

use agentlink_core::{
    current_supported_versions, negotiate_with_peer, ControlPlane, ControlPlaneConfig,
    HandshakeError, ProtocolVersion, ProtocolVersionList, VersionError,
};

#[test]
fn test_both_sides_agree() {
    let server = ProtocolVersionList::parse("1.3,2.1").unwrap();
    let client = ProtocolVersionList::parse("1.5,2.0").unwrap();

    let on_server = negotiate_with_peer(&server, &client.to_string()).unwrap();
    let on_client = negotiate_with_peer(&client, &server.to_string()).unwrap();

    assert_eq!(on_server, ProtocolVersion::new(2, 0));
    assert_eq!(on_server, on_client);
}

#[test]
fn test_no_shared_major() {
    let a = ProtocolVersionList::parse("1.0").unwrap();
    let b = ProtocolVersionList::parse("2.0").unwrap();
    assert_eq!(a.negotiate(&b), None);
    assert!(matches!(
        negotiate_with_peer(&a, "2.0"),
        Err(HandshakeError::Incompatible { .. })
    ));
}

#[test]
fn test_parse_failures() {
    for bad in ["1", "1.2.3", "a.1", "1.b", "0.5"] {
        assert!(
            matches!(ProtocolVersion::parse(bad), Err(VersionError::Parse(_))),
            "{:?} should fail to parse",
            bad
        );
    }
}

#[test]
fn test_list_validation() {
    let build = |versions: &[(u64, u64)]| ProtocolVersionList {
        versions: versions
            .iter()
            .map(|&(major, minor)| ProtocolVersion::new(major, minor))
            .collect(),
    };

    assert_eq!(build(&[]).validate(), Err(VersionError::EmptyList));
    assert!(matches!(
        build(&[(1, 0), (1, 1)]).validate(),
        Err(VersionError::DuplicateMajor(1))
    ));
    assert_eq!(build(&[(2, 0), (1, 0)]).validate(), Err(VersionError::Unsorted));
    assert!(matches!(
        build(&[(0, 1)]).validate(),
        Err(VersionError::InvalidMajor(_))
    ));
    assert!(build(&[(1, 3), (2, 0)]).validate().is_ok());
    assert!(ProtocolVersionList::new(vec![ProtocolVersion::new(2, 0), ProtocolVersion::new(1, 0)]).is_err());
}

#[test]
fn test_older_client_against_current_build() {
    let plane = ControlPlane::from_config(&ControlPlaneConfig::default()).unwrap();
    assert_eq!(plane.supported_versions(), &current_supported_versions());

    // A client that only knows 1.0 gets 1.0 features.
    assert_eq!(plane.negotiate("1.0").unwrap(), ProtocolVersion::new(1, 0));
    // A newer client is held back to what this build implements.
    assert_eq!(plane.negotiate("1.9").unwrap(), ProtocolVersion::new(1, 3));
    // Garbage is rejected, not treated as incompatible.
    assert!(matches!(
        plane.negotiate("1.0,,2.0"),
        Err(HandshakeError::InvalidAdvertisement(_))
    ));
}
