use alluvial_core::errors::{AlluvialError, ErrorInfo};
use alluvial_core::{Depth, NodeId};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("network", "A")
        .with_context("leaf", 3)
}

#[test]
fn network_error_surface() {
    let err = AlluvialError::Network(sample_info("duplicate-network", "network already exists"));
    assert_eq!(err.code(), "duplicate-network");
    assert_eq!(err.info().context.get("leaf").map(String::as_str), Some("3"));
}

#[test]
fn tree_error_surface() {
    let err = AlluvialError::Tree(sample_info("unknown-node", "stale handle"));
    assert_eq!(err.info().code, "unknown-node");
    assert!(err.to_string().starts_with("tree error: stale handle (code: unknown-node)"));
}

#[test]
fn layout_error_surface() {
    let err = AlluvialError::Layout(ErrorInfo::new("invalid-parameter", "negative height"))
        .with_context("parameter", "height");
    assert_eq!(err.code(), "invalid-parameter");
    assert_eq!(
        err.to_string(),
        "layout error: negative height (code: invalid-parameter) | context: [parameter=height]"
    );
}

#[test]
fn serde_error_surface() {
    let err = AlluvialError::Serde(
        ErrorInfo::new("deserialize-json", "unexpected token").with_hint("check the input file"),
    );
    assert!(err.to_string().ends_with("| hint: check the input file"));
    let json = serde_json::to_string(&err).unwrap();
    let restored: AlluvialError = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, err);
}

#[test]
fn handles_and_depths_are_plain_values() {
    let id = NodeId::from_raw(7);
    assert_eq!(id.as_raw(), 7);
    assert_eq!(id.index(), 7);
    assert_eq!(id.to_string(), "#7");
    assert_eq!(Depth::Root.as_u8(), 0);
    assert_eq!(Depth::LeafNode.as_u8(), 6);
    assert!(Depth::Module < Depth::StreamlineNode);
}

#[test]
fn family_constructors_match_the_serialized_tag() {
    let cases = [
        AlluvialError::network("unknown-network", "missing"),
        AlluvialError::tree("unknown-node", "stale"),
        AlluvialError::layout("invalid-parameter", "bad"),
        AlluvialError::serde("deserialize-toml", "bad toml"),
    ];
    for err in cases {
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["family"], err.family());
        assert!(err.info().context.is_empty());
    }
    let err = AlluvialError::network("invalid-leaf", "negative flow").with_context("leaf", 2);
    assert_eq!(err.info().context_value("leaf"), Some("2"));
    assert_eq!(err.info().context_value("network"), None);
}
