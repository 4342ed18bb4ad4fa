use alluvial_core::{Depth, NodeId, Side, TreePath};
use alluvial_graph::{canonical_hash, Diagram, LeafInput, NetworkInput};

fn network(id: &str, leaves: &[(&str, &str, f64)]) -> NetworkInput {
    NetworkInput::new(
        id,
        leaves
            .iter()
            .map(|(identifier, path, flow)| LeafInput::new(*identifier, *path, *flow))
            .collect(),
    )
}

fn module(diagram: &Diagram, network_id: &str, path: &str) -> NodeId {
    diagram
        .module(network_id, &TreePath::parse(path).unwrap())
        .unwrap()
}

fn streamlines(diagram: &Diagram, module: NodeId, side: Side) -> Vec<NodeId> {
    diagram
        .children(module)
        .iter()
        .flat_map(|group| {
            let branch = diagram.as_group(*group).unwrap().branch(side);
            diagram.children(branch).to_vec()
        })
        .collect()
}

fn module_path_of(diagram: &Diagram, streamline: NodeId) -> String {
    let module = diagram.ancestor(streamline, Depth::Module).unwrap();
    diagram.as_module(module).unwrap().path.path_string()
}

#[test]
fn one_module_links_to_two_modules_in_previous_network() {
    let mut diagram = Diagram::new();
    diagram
        .add_network(network("A", &[("x", "1:1", 1.0), ("y", "1:2", 1.0), ("z", "2:1", 1.0)]))
        .unwrap();
    diagram
        .add_network(network("B", &[("x", "1:1", 1.0), ("y", "1:2", 1.0), ("z", "1:3", 1.0)]))
        .unwrap();
    diagram.calc_flow().unwrap();

    let b1 = module(&diagram, "B", "1");
    let left = streamlines(&diagram, b1, Side::Left);
    assert_eq!(left.len(), 2);

    let mut partners: Vec<(String, f64)> = left
        .iter()
        .map(|streamline| {
            let opposite = diagram.opposite_streamline(*streamline).unwrap().unwrap();
            assert_eq!(diagram.as_streamline(opposite).unwrap().side, Side::Right);
            assert_eq!(diagram.flow(opposite).unwrap(), diagram.flow(*streamline).unwrap());
            (module_path_of(&diagram, opposite), diagram.flow(opposite).unwrap())
        })
        .collect();
    partners.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(partners, vec![("1".to_string(), 2.0), ("2".to_string(), 1.0)]);
    assert_eq!(diagram.flow(b1).unwrap(), 3.0);

    let a1 = module(&diagram, "A", "1");
    assert_eq!(streamlines(&diagram, a1, Side::Right).len(), 1);
    assert!(diagram.check_invariants().is_empty());
}

#[test]
fn linked_streamline_ids_mirror_each_other() {
    let mut diagram = Diagram::new();
    diagram.add_network(network("A", &[("x", "1:1", 1.0)])).unwrap();
    diagram.add_network(network("B", &[("x", "2:1", 1.0)])).unwrap();

    let id = "B_module2_group-1_left--A_module1_group-1_right";
    let streamline = diagram.streamline_by_id(id).unwrap();
    let opposite = diagram.opposite_streamline(streamline).unwrap().unwrap();
    assert_eq!(
        diagram.id_of(opposite).unwrap(),
        "A_module1_group-1_right--B_module2_group-1_left"
    );
    assert!(diagram.streamline_by_id("A_module1_group-1_right").is_none());
    assert!(diagram.streamline_by_id("A_module1_group-1_left").is_some());
    assert!(diagram.streamline_by_id("B_module2_group-1_right").is_some());
}

#[test]
fn first_network_left_branch_carries_group_flow() {
    let mut diagram = Diagram::new();
    diagram
        .add_network(network("A", &[("x", "1:1", 0.25), ("y", "1:2", 0.5)]))
        .unwrap();
    diagram.add_network(network("B", &[("x", "1:1", 0.25)])).unwrap();
    diagram.calc_flow().unwrap();

    let a1 = module(&diagram, "A", "1");
    let group = diagram.children(a1)[0];
    let left = diagram.as_group(group).unwrap().branch(Side::Left);
    assert_eq!(diagram.flow(left).unwrap(), 0.75);
    assert_eq!(diagram.flow(group).unwrap(), 0.75);
    assert_eq!(diagram.num_leaf_nodes(group), 2);
    assert!(diagram.check_invariants().is_empty());
}

#[test]
fn dangling_streamlines_with_same_identity_merge() {
    let mut diagram = Diagram::new();
    diagram
        .add_network(network("A", &[("x", "1:1", 1.0), ("y", "1:2", 1.0)]))
        .unwrap();
    diagram
        .add_network(network("B", &[("x", "1:1", 1.0), ("y", "2:1", 1.0)]))
        .unwrap();

    let a1 = module(&diagram, "A", "1");
    assert_eq!(streamlines(&diagram, a1, Side::Right).len(), 2);

    let x_b = diagram.find_leaf("B", "x").unwrap();
    let y_b = diagram.find_leaf("B", "y").unwrap();
    diagram.remove_leaf(x_b, false).unwrap();
    assert_eq!(streamlines(&diagram, a1, Side::Right).len(), 2);
    diagram.remove_leaf(y_b, false).unwrap();

    let right = streamlines(&diagram, a1, Side::Right);
    assert_eq!(right.len(), 1);
    let dangling = diagram.streamline_by_id("A_module1_group-1_right").unwrap();
    assert_eq!(right[0], dangling);
    assert!(diagram.as_streamline(dangling).unwrap().link.is_none());

    let mut held: Vec<String> = diagram
        .children(dangling)
        .iter()
        .map(|leaf| diagram.as_leaf(*leaf).unwrap().identifier.clone())
        .collect();
    held.sort();
    assert_eq!(held, vec!["x".to_string(), "y".to_string()]);

    diagram.calc_flow().unwrap();
    assert!(diagram.check_invariants().is_empty());
}

#[test]
fn removing_a_detached_leaf_again_is_a_no_op() {
    let mut diagram = Diagram::new();
    diagram
        .add_network(network("A", &[("x", "1:1", 1.0), ("y", "1:2", 1.0)]))
        .unwrap();
    let x = diagram.find_leaf("A", "x").unwrap();
    diagram.remove_leaf(x, false).unwrap();
    let hash = canonical_hash(&diagram).unwrap();
    let streamlines = diagram.num_streamlines();

    diagram.remove_leaf(x, false).unwrap();
    assert_eq!(canonical_hash(&diagram).unwrap(), hash);
    assert_eq!(diagram.num_streamlines(), streamlines);
    assert!(!diagram.as_leaf(x).unwrap().is_attached());
}

#[test]
fn opposite_references_are_symmetric() {
    let mut diagram = Diagram::new();
    diagram.add_network(network("A", &[("x", "1:1", 1.0)])).unwrap();
    diagram.add_network(network("B", &[("x", "1:1", 1.0)])).unwrap();

    let x_a = diagram.find_leaf("A", "x").unwrap();
    let x_b = diagram.find_leaf("B", "x").unwrap();
    assert_eq!(diagram.as_leaf(x_b).unwrap().opposite(Side::Left), Some(x_a));
    assert_eq!(diagram.as_leaf(x_a).unwrap().opposite(Side::Right), Some(x_b));
    assert_eq!(diagram.as_leaf(x_a).unwrap().opposite(Side::Left), None);
}
