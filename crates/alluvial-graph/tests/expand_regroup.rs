use alluvial_core::{Depth, NodeId, Side, TreePath};
use alluvial_graph::{canonical_hash, Diagram, LayoutConfig, LeafInput, MutationOutcome, NetworkInput};

fn network(id: &str, leaves: &[(&str, &str, f64)]) -> NetworkInput {
    NetworkInput::new(
        id,
        leaves
            .iter()
            .map(|(identifier, path, flow)| LeafInput::new(*identifier, *path, *flow))
            .collect(),
    )
}

fn path(value: &str) -> TreePath {
    TreePath::parse(value).unwrap()
}

fn module_paths(diagram: &Diagram, network_id: &str) -> Vec<String> {
    let network = diagram.network(network_id).unwrap();
    let mut paths: Vec<String> = diagram
        .children(network)
        .iter()
        .map(|module| diagram.as_module(*module).unwrap().path.path_string())
        .collect();
    paths.sort();
    paths
}

fn nested() -> Diagram {
    let mut diagram = Diagram::new();
    diagram
        .add_network(network(
            "A",
            &[("a", "1:2:1", 0.25), ("b", "1:2:2", 0.25), ("c", "1:3:1", 0.5)],
        ))
        .unwrap();
    diagram
}

#[test]
fn expand_then_regroup_restores_structure() {
    let mut diagram = nested();
    let before = canonical_hash(&diagram).unwrap();
    let top = diagram.module("A", &path("1")).unwrap();
    assert!(diagram.has_submodules(top).unwrap());

    let outcome = diagram.expand(top).unwrap();
    assert_eq!(outcome, MutationOutcome { changed: true, leaves_updated: 3 });
    assert_eq!(module_paths(&diagram, "A"), vec!["1:2", "1:3"]);
    assert!(diagram.module("A", &path("1")).is_none());

    let sub = diagram.module("A", &path("1:2")).unwrap();
    assert_eq!(diagram.as_module(sub).unwrap().module_level, 2);
    assert_eq!(diagram.num_leaf_nodes(sub), 2);
    assert!(!diagram.has_submodules(sub).unwrap());

    let refused = diagram.expand(sub).unwrap();
    assert_eq!(refused, MutationOutcome::unchanged());
    assert_eq!(module_paths(&diagram, "A"), vec!["1:2", "1:3"]);

    let outcome = diagram.regroup(sub).unwrap();
    assert_eq!(outcome.leaves_updated, 3);
    assert_eq!(module_paths(&diagram, "A"), vec!["1"]);
    assert_eq!(canonical_hash(&diagram).unwrap(), before);

    diagram.calc_flow().unwrap();
    assert!(diagram.check_invariants().is_empty());
}

#[test]
fn regroup_at_top_level_is_refused() {
    let mut diagram = nested();
    let before = canonical_hash(&diagram).unwrap();
    let top = diagram.module("A", &path("1")).unwrap();

    assert_eq!(diagram.regroup(top).unwrap(), MutationOutcome::unchanged());
    assert_eq!(canonical_hash(&diagram).unwrap(), before);
}

#[test]
fn expand_refuses_module_with_leaves_at_the_next_level() {
    let mut diagram = Diagram::new();
    diagram
        .add_network(network("A", &[("a", "1:1", 0.5), ("b", "1:2:1", 0.5)]))
        .unwrap();
    let before = canonical_hash(&diagram).unwrap();
    let top = diagram.module("A", &path("1")).unwrap();

    assert!(diagram.has_submodules(top).unwrap());
    assert!(!diagram.expand(top).unwrap().changed);
    assert_eq!(canonical_hash(&diagram).unwrap(), before);
}

#[test]
fn regroup_merges_only_siblings_under_the_same_parent() {
    let mut diagram = Diagram::new();
    diagram
        .add_network(network(
            "A",
            &[
                ("a", "1:1:1", 0.2),
                ("b", "1:2:1", 0.2),
                ("c", "2:1:1", 0.3),
                ("d", "2:2:1", 0.3),
            ],
        ))
        .unwrap();
    for top in ["1", "2"] {
        let module = diagram.module("A", &path(top)).unwrap();
        diagram.expand(module).unwrap();
    }
    assert_eq!(module_paths(&diagram, "A"), vec!["1:1", "1:2", "2:1", "2:2"]);

    let module = diagram.module("A", &path("2:1")).unwrap();
    diagram.regroup(module).unwrap();
    assert_eq!(module_paths(&diagram, "A"), vec!["1:1", "1:2", "2"]);
}

#[test]
fn expanded_module_relinks_against_neighbour() {
    let mut diagram = Diagram::new();
    diagram
        .add_network(network("A", &[("a", "1:1:1", 0.5), ("b", "1:2:1", 0.5)]))
        .unwrap();
    diagram
        .add_network(network("B", &[("a", "1:1", 0.5), ("b", "2:1", 0.5)]))
        .unwrap();
    let a1 = diagram.module("A", &path("1")).unwrap();
    assert_eq!(diagram.num_streamlines(), 7);

    diagram.expand(a1).unwrap();
    diagram.calc_flow().unwrap();
    assert!(diagram.check_invariants().is_empty());

    for (b_module, expected) in [("1", "1:1"), ("2", "1:2")] {
        let module = diagram.module("B", &path(b_module)).unwrap();
        let group = diagram.children(module)[0];
        let left = diagram.as_group(group).unwrap().branch(Side::Left);
        let streamlines = diagram.children(left);
        assert_eq!(streamlines.len(), 1);
        let opposite = diagram.opposite_streamline(streamlines[0]).unwrap().unwrap();
        let partner_module: NodeId = diagram.ancestor(opposite, Depth::Module).unwrap();
        assert_eq!(
            diagram.as_module(partner_module).unwrap().path.path_string(),
            expected
        );
        assert_eq!(diagram.flow(opposite).unwrap(), 0.5);
    }
}

#[test]
fn manual_order_survives_layout_until_structure_changes() {
    let mut diagram = Diagram::new();
    diagram
        .add_network(network(
            "A",
            &[("a", "1:1:1", 0.5), ("b", "1:2:1", 0.25), ("c", "2:1", 0.25)],
        ))
        .unwrap();
    diagram.calc_flow().unwrap();
    let config = LayoutConfig::default();
    diagram.update_layout(&config).unwrap();

    let network = diagram.network("A").unwrap();
    let first = diagram.module_at(network, 0).unwrap();
    let second = diagram.module_at(network, 1).unwrap();
    assert_eq!(diagram.as_module(first).unwrap().path.path_string(), "1");

    assert!(diagram.move_down(first).unwrap() == MutationOutcome::unchanged());
    assert!(diagram.move_up(second).unwrap() == MutationOutcome::unchanged());

    let outcome = diagram.move_up(first).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.leaves_updated, 0);
    assert!(diagram.as_network(network).unwrap().custom_sorted);
    assert_eq!(diagram.module_at(network, 1), Some(first));

    diagram.update_layout(&config).unwrap();
    assert_eq!(diagram.module_at(network, 0), Some(second));
    assert!(diagram.layout(first).unwrap().y < diagram.layout(second).unwrap().y);

    diagram.move_down(first).unwrap();
    diagram.move_up(first).unwrap();
    diagram.expand(first).unwrap();
    assert!(!diagram.as_network(network).unwrap().custom_sorted);
    diagram.calc_flow().unwrap();
    diagram.update_layout(&config).unwrap();
    let bottom = diagram.module_at(network, 0).unwrap();
    assert_eq!(diagram.as_module(bottom).unwrap().path.path_string(), "1:1");
}

#[test]
fn highlight_change_moves_leaf_to_its_own_group() {
    let mut diagram = Diagram::new();
    diagram
        .add_network(network("A", &[("a", "1:1", 0.5), ("b", "1:2", 0.5)]))
        .unwrap();
    let a = diagram.find_leaf("A", "a").unwrap();
    let module = diagram.module("A", &path("1")).unwrap();
    assert_eq!(diagram.children(module).len(), 1);

    let outcome = diagram.set_highlight_index(&[a], 2).unwrap();
    assert_eq!(outcome.leaves_updated, 1);
    assert_eq!(diagram.children(module).len(), 2);
    let group = diagram.ancestor(a, Depth::HighlightGroup).unwrap();
    assert_eq!(diagram.as_group(group).unwrap().highlight_index, 2);

    assert!(!diagram.set_highlight_index(&[a], 2).unwrap().changed);
    diagram.set_highlight_index(&[a], -1).unwrap();
    assert_eq!(diagram.children(module).len(), 1);
}
