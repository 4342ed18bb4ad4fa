use alluvial_core::TreePath;
use alluvial_graph::{Diagram, LayoutConfig, LeafInput, NetworkInput};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const NETWORKS: usize = 6;
const LEAVES: usize = 400;

/// Deterministic three-level partitions that drift a little between networks.
fn synthetic_networks() -> Vec<NetworkInput> {
    (0..NETWORKS)
        .map(|network| {
            let nodes = (0..LEAVES)
                .map(|leaf| {
                    let top = (leaf + network * 7) % 12 + 1;
                    let sub = (leaf / 12 + network) % 4 + 1;
                    let flow = 1.0 / LEAVES as f64;
                    LeafInput::new(format!("n{leaf}"), format!("{top}:{sub}:{}", leaf % 5 + 1), flow)
                        .with_highlight(if leaf % 17 == 0 { 1 } else { -1 })
                })
                .collect();
            NetworkInput::new(format!("net{network}"), nodes)
        })
        .collect()
}

fn build(networks: &[NetworkInput]) -> Diagram {
    let mut diagram = Diagram::new();
    for network in networks {
        diagram.add_network(network.clone()).expect("network");
    }
    diagram
}

fn bench_ingest_and_layout(c: &mut Criterion) {
    let networks = synthetic_networks();
    let config = LayoutConfig::default();
    c.bench_function("ingest_and_layout", |b| {
        b.iter(|| {
            let mut diagram = build(black_box(&networks));
            diagram.calc_flow().expect("flow");
            diagram.update_layout(&config).expect("layout");
            black_box(diagram.num_streamlines());
        });
    });
}

fn bench_expand_regroup(c: &mut Criterion) {
    let networks = synthetic_networks();
    let config = LayoutConfig::default();
    let mut diagram = build(&networks);
    let path = TreePath::parse("3").expect("path");
    c.bench_function("expand_regroup_cycle", |b| {
        b.iter(|| {
            let module = diagram.module("net2", &path).expect("module");
            diagram.expand(module).expect("expand");
            diagram.calc_flow().expect("flow");
            diagram.update_layout(&config).expect("layout");
            let network = diagram.network("net2").expect("network");
            let sub = diagram
                .children(network)
                .iter()
                .copied()
                .find(|m| diagram.as_module(*m).map(|d| d.module_level == 2).unwrap_or(false))
                .expect("submodule");
            diagram.regroup(sub).expect("regroup");
            black_box(diagram.calc_flow().expect("flow"));
        });
    });
}

criterion_group!(benches, bench_ingest_and_layout, bench_expand_regroup);
criterion_main!(benches);
