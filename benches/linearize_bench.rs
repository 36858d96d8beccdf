use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use mesh_linearize::algs::NoComm;
use mesh_linearize::linearize::selector::select_candidates;
use mesh_linearize::linearize::{FirstOrderFromSecondOrder, IdStrategy, LinearizeOptions};
use mesh_linearize::mesh::neighbors::build_connectivity;
use mesh_linearize::mesh::{MeshBase, StructuredGrid};
use mesh_linearize::topology::cell_type::ElemType;

fn bench_linearize(c: &mut Criterion) {
    let mut group = c.benchmark_group("linearize");

    for &n in &[16usize, 64] {
        let grid = StructuredGrid::new(ElemType::Quad9, [n, n, 0]).expect("valid grid");
        let mesh = grid.build(NoComm).expect("grid builds");

        for (name, strategy) in [
            ("prefix_sum", IdStrategy::PrefixSum),
            ("parent_strided", IdStrategy::ParentStrided),
        ] {
            let stage = FirstOrderFromSecondOrder::new(
                LinearizeOptions::new([0]).with_id_strategy(strategy),
            )
            .expect("valid options");
            group.bench_with_input(BenchmarkId::new(name, n), &n, |b, _| {
                b.iter_batched(
                    || grid.build(NoComm).expect("grid builds"),
                    |mut m| {
                        let report = stage.apply(&mut m).expect("conversion succeeds");
                        black_box(report);
                    },
                    BatchSize::LargeInput,
                );
            });
        }

        group.bench_with_input(BenchmarkId::new("select_candidates", n), &n, |b, _| {
            b.iter(|| black_box(select_candidates(mesh.active_elements(), &[0]).map(|c| c.len())));
        });

        group.bench_with_input(BenchmarkId::new("build_connectivity", n), &n, |b, _| {
            b.iter(|| black_box(build_connectivity(mesh.active_elements())));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_linearize);
criterion_main!(benches);
