//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::Bytes;
use midst::name::{Name, NameComponent};

#[test]
fn test_name_encode() {
    let name = Name::from("/a/b");
    assert_eq!(
        name.to_bytes().as_ref(),
        &[0x07, 0x06, 0x08, 0x01, 0x61, 0x08, 0x01, 0x62]
    );
}

#[test]
fn test_name_decode() {
    let bytes = [0x07, 0x06, 0x08, 0x01, 0x61, 0x08, 0x01, 0x62];
    let mut buf = Bytes::copy_from_slice(&bytes);
    let name = Name::decode(&mut buf).unwrap();
    assert_eq!(name, Name::from("/a/b"));
}

#[test]
fn test_name_round_trip() {
    for uri in ["/", "/a", "/ndn/nlsr/LSA", "/site-1/router.a"] {
        let name = Name::from(uri);
        let mut buf = name.to_bytes();
        assert_eq!(Name::decode(&mut buf).unwrap(), name);
    }
}

#[test]
fn test_name_display() {
    assert_eq!(Name::from("/a/b").to_string(), "/a/b");
    assert_eq!(Name::new().to_string(), "/");
}

#[test]
fn test_name_number_components() {
    let name = Name::from("/r").append_number(1000);
    let component = name.get_back(0).unwrap();
    assert_eq!(component.to_number().unwrap(), 1000);
}

#[test]
fn test_name_embedded_name_component() {
    let router = Name::from("/ndn/site/router");
    let name = Name::from("/n").append_name(&router);
    let component = name.get_back(0).unwrap();
    assert_eq!(component.to_name().unwrap(), router);
}

#[test]
fn test_name_prefix_and_position() {
    let name = Name::from("/a/site/nlsr/DV").append_number(7);
    assert_eq!(name.position_of("DV"), Some(3));
    assert_eq!(name.prefix(2), Name::from("/a/site"));
    assert_eq!(name.sub_name(1, 2), Name::from("/site/nlsr"));
    assert!(name.starts_with(&Name::from("/a/site")));
    assert!(!name.starts_with(&Name::from("/a/x")));
}

#[test]
fn test_name_version_segment() {
    let name = Name::from("/d").append_version(42).append_segment(0);
    let mut buf = name.to_bytes();
    let decoded = Name::decode(&mut buf).unwrap();
    assert_eq!(decoded, name);
    assert_eq!(decoded.get_back(1).unwrap().to_number().unwrap(), 42);
}

#[test]
fn test_name_ordering() {
    let mut names = vec![
        Name::from("/b"),
        Name::from("/a/c"),
        Name::from("/a"),
    ];
    names.sort();
    assert_eq!(
        names,
        vec![Name::from("/a"), Name::from("/a/c"), Name::from("/b")]
    );
}

#[test]
fn test_component_display_escaping() {
    let component = NameComponent::generic(vec![0x61, 0x20, 0xff]);
    assert_eq!(component.to_string(), "a%20%FF");
}
