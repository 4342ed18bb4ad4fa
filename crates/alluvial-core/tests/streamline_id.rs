use alluvial_core::{endpoint_key, Side, StreamlineId, TreePath, LINK_SEPARATOR};

#[test]
fn endpoint_keys_name_network_module_group_and_side() {
    let path = TreePath::parse("1:2").unwrap();
    assert_eq!(
        endpoint_key("net", &path, -1, false, Side::Left),
        "net_module1:2_group-1_left"
    );
    assert_eq!(
        endpoint_key("net", &path, 3, true, Side::Right),
        "net_module1:2_groupi3_right"
    );
    let marked = TreePath::parse("1;2").unwrap();
    assert_eq!(
        endpoint_key("net", &marked, 0, false, Side::Left),
        "net_module1:2_group0_left"
    );
}

#[test]
fn linked_identity_encodes_both_endpoints() {
    let id = StreamlineId::new("a_left", Some("b_right".to_string()));
    assert_eq!(id.encode(), format!("a_left{LINK_SEPARATOR}b_right"));
    assert_eq!(id.to_string(), id.encode());
    assert!(!id.is_dangling());
    assert_eq!(id.source(), "a_left");
    assert_eq!(id.target(), Some("b_right"));

    let mirrored = id.opposite().unwrap();
    assert_eq!(mirrored.encode(), "b_right--a_left");
    assert_eq!(mirrored.opposite().unwrap(), id);
}

#[test]
fn dangling_identities_collide_per_source() {
    let mut linked = StreamlineId::new("a_right", Some("b_left".to_string()));
    let dangling = StreamlineId::dangling("a_right");
    assert!(dangling.is_dangling());
    assert_eq!(dangling.opposite(), None);
    assert_eq!(dangling.encode(), "a_right");

    assert_eq!(linked.make_dangling(), Some("b_left".to_string()));
    assert_eq!(linked, dangling);
    assert_eq!(linked.make_dangling(), None);
}

#[test]
fn sides_mirror_and_label() {
    assert_eq!(Side::Left.opposite(), Side::Right);
    assert_eq!(Side::Right.opposite(), Side::Left);
    assert_eq!(Side::BOTH.map(Side::index), [0, 1]);
    assert_eq!(Side::Right.to_string(), "right");
    assert_eq!(serde_json::to_string(&Side::Left).unwrap(), "\"left\"");
}
