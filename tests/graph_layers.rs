use std::collections::HashSet;
use std::error::Error;

use stagedag::actions::Action;
use stagedag::config::model::{ConfigFile, PipelineSection, SourceSection};
use stagedag::dag::{TaskGraph, TaskNode};
use stagedag::errors::GraphError;
use stagedag::pipeline::{
    self, CREATE_TABLES, CREATE_VIEW, LOAD_ORDER_ITEMS, LOAD_ORDERS, LOAD_PRODUCTS,
    TRUNCATE_STAGING,
};

type TestResult = Result<(), Box<dyn Error>>;

fn node(id: &str) -> TaskNode {
    // Action choice is irrelevant for structural tests.
    TaskNode::new(id, Action::EnsureSchema)
}

fn sample_config() -> ConfigFile {
    ConfigFile {
        pipeline: PipelineSection::default(),
        source: SourceSection {
            orders: "/tmp/orders.csv".into(),
            order_items: "/tmp/order_items.csv".into(),
            products: "/tmp/products.csv".into(),
        },
    }
}

#[test]
fn layers_partition_every_node_once_with_deps_strictly_earlier() -> TestResult {
    // Diamond with a tail: a -> {b, c} -> d -> e.
    let mut graph = TaskGraph::new();
    graph.add_node(node("a"))?;
    graph.add_node(node("b").after("a"))?;
    graph.add_node(node("c").after("a"))?;
    graph.add_node(node("d").after("b").after("c"))?;
    graph.add_node(node("e").after("d"))?;

    let layers = graph.topological_layers()?;

    let mut seen: HashSet<String> = HashSet::new();
    for layer in &layers {
        for id in layer {
            assert!(seen.insert(id.clone()), "node {id} appears twice");
        }
    }
    assert_eq!(seen.len(), graph.len(), "layers must cover every node");

    // Every dependency sits in a strictly earlier layer.
    let layer_of = |id: &str| layers.iter().position(|l| l.iter().any(|n| n == id));
    for id in graph.ids() {
        let own = layer_of(id).expect("node missing from layers");
        for dep in graph.dependencies_of(id) {
            let dep_layer = layer_of(dep).expect("dep missing from layers");
            assert!(dep_layer < own, "dep {dep} not before {id}");
        }
    }

    // b and c are independent and share a layer.
    assert_eq!(layers[1].len(), 2);
    Ok(())
}

#[test]
fn duplicate_id_is_rejected() -> TestResult {
    let mut graph = TaskGraph::new();
    graph.add_node(node("a"))?;
    let err = graph.add_node(node("a")).unwrap_err();
    assert_eq!(err, GraphError::DuplicateId("a".to_string()));
    Ok(())
}

#[test]
fn unknown_dependency_is_rejected() -> TestResult {
    let mut graph = TaskGraph::new();
    graph.add_node(node("a").after("ghost"))?;
    let err = graph.validate().unwrap_err();
    assert_eq!(
        err,
        GraphError::UnknownDependency {
            node: "a".to_string(),
            dependency: "ghost".to_string(),
        }
    );
    Ok(())
}

#[test]
fn self_dependency_is_a_cycle() -> TestResult {
    let mut graph = TaskGraph::new();
    graph.add_node(node("a").after("a"))?;
    let err = graph.validate().unwrap_err();
    assert_eq!(err, GraphError::CycleDetected("a".to_string()));
    Ok(())
}

#[test]
fn cycle_names_an_offending_node() -> TestResult {
    let mut graph = TaskGraph::new();
    graph.add_node(node("a").after("c"))?;
    graph.add_node(node("b").after("a"))?;
    graph.add_node(node("c").after("b"))?;

    match graph.validate() {
        Err(GraphError::CycleDetected(id)) => {
            assert!(["a", "b", "c"].contains(&id.as_str()), "unexpected node {id}");
        }
        other => panic!("expected CycleDetected, got {other:?}"),
    }

    // Layering must refuse the same graph.
    assert!(matches!(
        graph.topological_layers(),
        Err(GraphError::CycleDetected(_))
    ));
    Ok(())
}

#[test]
fn product_status_pipeline_layers_match_fk_ordering() -> TestResult {
    let graph = pipeline::build_graph(&sample_config(), "2024-11-20T10:00:00")?;
    let layers = graph.topological_layers()?;

    assert_eq!(layers.len(), 5);
    assert_eq!(layers[0], vec![TRUNCATE_STAGING.to_string()]);
    assert_eq!(layers[1], vec![CREATE_TABLES.to_string()]);

    let loads: HashSet<&str> = layers[2].iter().map(|s| s.as_str()).collect();
    assert_eq!(loads, HashSet::from([LOAD_ORDERS, LOAD_PRODUCTS]));

    assert_eq!(layers[3], vec![LOAD_ORDER_ITEMS.to_string()]);
    assert_eq!(layers[4], vec![CREATE_VIEW.to_string()]);
    Ok(())
}

#[test]
fn logical_timestamp_is_substituted_into_source_paths() -> TestResult {
    let mut cfg = sample_config();
    cfg.source.orders = "/data/orders_{ts}.csv".into();

    let graph = pipeline::build_graph(&cfg, "2024-11-20")?;
    let node = graph.node(LOAD_ORDERS).expect("load_orders missing");
    match &node.action {
        Action::BulkLoad { source, .. } => {
            assert_eq!(source.to_string_lossy(), "/data/orders_2024-11-20.csv");
        }
        other => panic!("expected BulkLoad, got {other:?}"),
    }
    Ok(())
}
