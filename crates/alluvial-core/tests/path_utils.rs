use alluvial_core::{difference_index, AlluvialError, PathError, TreePath};
use proptest::prelude::*;

#[test]
fn parses_colon_separated_segments() {
    let path = TreePath::parse("1:3:2").unwrap();
    assert_eq!(path.segments(), &[1, 3, 2]);
    assert_eq!(path.level(), 3);
    assert_eq!(path.path_string(), "1:3:2");
    assert_eq!(path.to_string(), "1:3:2");
    assert!(!path.is_insignificant_at(1));
}

#[test]
fn semicolon_marks_the_preceding_level_insignificant() {
    let path = TreePath::parse("1;2:1").unwrap();
    assert_eq!(path.segments(), &[1, 2, 1]);
    assert!(path.is_insignificant_at(1));
    assert!(!path.is_insignificant_at(2));
    assert!(!path.is_insignificant_at(0));
    assert!(!path.is_insignificant_at(9));
    assert_eq!(path.to_string(), "1;2:1");
    assert_eq!(path.path_string(), "1:2:1");

    let trailing = TreePath::parse("4:2;").unwrap();
    assert_eq!(trailing.segments(), &[4, 2]);
    assert!(trailing.is_insignificant_at(2));
    assert_eq!(trailing.to_string(), "4:2;");
}

#[test]
fn rejects_malformed_paths() {
    assert_eq!(TreePath::parse("  "), Err(PathError::Empty));
    for text in ["0:1", "1::2", "a", "1:-2", ":1"] {
        assert!(
            matches!(TreePath::parse(text), Err(PathError::InvalidSegment { .. })),
            "{text} should not parse"
        );
    }
    let err: AlluvialError = TreePath::parse("x").unwrap_err().into();
    assert_eq!(err.code(), "invalid-path");
}

#[test]
fn ancestors_truncate_and_keep_markers() {
    let path = TreePath::parse("2;5:1").unwrap();
    let top = path.ancestor_at_level(1);
    assert_eq!(top.to_string(), "2;");
    assert_eq!(top.path_string(), "2");
    assert_eq!(path.ancestor_at_level(9), path);
    assert_eq!(path.parent().unwrap().path_string(), "2:5");
    assert_eq!(TreePath::root().parent(), None);

    assert!(top.is_ancestor_of(&path));
    assert!(path.is_ancestor_of(&path));
    assert!(TreePath::root().is_ancestor_of(&path));
    assert!(!path.is_ancestor_of(&top));
    assert!(!TreePath::parse("3").unwrap().is_ancestor_of(&path));
}

#[test]
fn difference_index_finds_the_first_divergence() {
    assert_eq!(difference_index(&[1, 2, 3], &[1, 2, 4]), 2);
    assert_eq!(difference_index(&[1], &[2]), 0);
    assert_eq!(difference_index(&[1, 2], &[1, 2, 3]), 2);
    assert_eq!(difference_index(&[], &[1]), 0);
}

#[test]
fn serde_uses_the_textual_form() {
    let path = TreePath::parse("1;3:2").unwrap();
    let json = serde_json::to_string(&path).unwrap();
    assert_eq!(json, "\"1;3:2\"");
    let restored: TreePath = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, path);
    assert!(serde_json::from_str::<TreePath>("\"1:0\"").is_err());
}

proptest! {
    #[test]
    fn display_parses_back(segments in prop::collection::vec(1u32..50, 1..6), marks in prop::collection::vec(any::<bool>(), 6)) {
        let text: String = segments
            .iter()
            .enumerate()
            .map(|(idx, segment)| {
                let separator = if idx + 1 == segments.len() { "" } else if marks[idx] { ";" } else { ":" };
                format!("{segment}{separator}")
            })
            .collect();
        let path = TreePath::parse(&text).unwrap();
        prop_assert_eq!(path.segments(), &segments[..]);
        prop_assert_eq!(path.to_string(), text);
        prop_assert_eq!(difference_index(path.segments(), &segments), segments.len());
    }
}
