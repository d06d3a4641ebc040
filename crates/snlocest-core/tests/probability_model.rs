//! The memoized probability model against the brute-force likelihood
//! on real geodesic distances.

mod common;

use common::{fixture_metric, load_fixture};
use snlocest_core::{
    predict, Detail, EdgeProbability, FitResult, GraphBackend, MethodKind, MethodSpec,
    NaiveProbabilityModel,
};

fn likelihood(detail: &Detail) -> (f64, f64, f64) {
    match *detail {
        Detail::Likelihood {
            score,
            neighbor_term,
            normalizer,
        } => (score, neighbor_term, normalizer),
        ref other => panic!("Expected likelihood detail, got {:?}", other),
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn test_optimized_matches_naive_on_fixture() {
    let graph = load_fixture(GraphBackend::Csr);
    let x = graph.labeled_indices().unwrap();
    let y = graph.labels().to_vec();
    let fit = FitResult::new(&x, &y).unwrap();

    // Every node, labeled or not, including the parallel edge at u08
    let all: Vec<u32> = (0..graph.num_nodes() as u32).collect();

    let mut fast = MethodSpec::new(MethodKind::ProbabilityModel)
        .build(Some(fixture_metric()))
        .unwrap();
    let mut naive = NaiveProbabilityModel::new(fixture_metric(), EdgeProbability::default()).unwrap();

    let expected = predict(graph.as_ref(), &mut naive, &fit, &all).unwrap();
    let actual = predict(graph.as_ref(), fast.as_mut(), &fit, &all).unwrap();

    for ((node, want), got) in all.iter().zip(&expected).zip(&actual) {
        let name = graph.name_of(*node).unwrap();
        assert_eq!(want.area, got.area, "Area differs for {}", name);
        assert_eq!(want.labeled_degree, got.labeled_degree);

        let (ws, wn, wz) = likelihood(&want.detail);
        let (gs, gn, gz) = likelihood(&got.detail);
        assert!(close(ws, gs), "{}: score {} vs {}", name, ws, gs);
        assert!(close(wn, gn), "{}: neighbor term {} vs {}", name, wn, gn);
        assert!(close(wz, gz), "{}: normalizer {} vs {}", name, wz, gz);
    }
}

#[test]
fn test_probability_model_prefers_nearby_cluster() {
    let graph = load_fixture(GraphBackend::AdjacencyList);
    let x = graph.labeled_indices().unwrap();
    let y = graph.labels().to_vec();
    let fit = FitResult::new(&x, &y).unwrap();

    let mut method = MethodSpec::new(MethodKind::ProbabilityModel)
        .build(Some(fixture_metric()))
        .unwrap();

    let u06 = graph.index_of("u06").unwrap();
    let u12 = graph.index_of("u12").unwrap();
    let estimates = predict(graph.as_ref(), method.as_mut(), &fit, &[u06, u12]).unwrap();

    assert_eq!(estimates[0].area, y[x.iter().position(|&n| n == u06).unwrap()]);
    assert!(estimates[1].area.is_none());
    assert_eq!(likelihood(&estimates[1].detail), (0.0, 0.0, 0.0));
}
