use std::collections::{HashMap, HashSet};

use crate::domain::graph::task_graph::TaskGraph;
use crate::error::{Error, Result};

/// Joins the per-pipeline graphs of one observation into a single workflow.
///
/// Graphs are merged in `workflows` order; consecutive pipelines are chained by a
/// zero-cost edge from the topologically last task of one to the topologically first
/// task of the next.
pub fn concatenate_workflows(mut graphs: HashMap<String, TaskGraph>, workflows: &[String]) -> Result<TaskGraph> {
    let mut seen = HashSet::new();
    if let Some(duplicate) = workflows.iter().find(|w| !seen.insert(w.as_str())) {
        return Err(Error::configuration(format!("Pipeline '{}' is listed twice for one observation", duplicate)));
    }

    let mut final_graph = TaskGraph::new();
    let mut previous_last: Option<String> = None;

    for workflow in workflows {
        let graph = graphs.remove(workflow).ok_or_else(|| Error::configuration(format!("No task graph was built for pipeline '{}'", workflow)))?;

        let order = graph.topological_order()?;
        let label_of = |idx: usize| order.get(idx).and_then(|&id| graph.node(id)).map(|n| n.label());
        let first = label_of(0);
        let last = order.len().checked_sub(1).and_then(label_of);

        final_graph.absorb(graph)?;

        if let (Some(parent), Some(child)) = (previous_last.as_deref(), first.as_deref()) {
            let (Some(parent), Some(child)) = (final_graph.find(parent), final_graph.find(child)) else {
                return Err(Error::GraphError(format!("Could not link '{}' to pipeline '{}'", parent, workflow)));
            };
            final_graph.add_edge(parent, child, 0.0, None)?;
        }

        if last.is_some() {
            previous_last = last;
        }
    }

    if !graphs.is_empty() {
        let mut unused: Vec<_> = graphs.keys().cloned().collect();
        unused.sort();
        log::warn!("Task graphs built but not part of the workflow: {}", unused.join(", "));
    }

    Ok(final_graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::task_graph::TaskNode;

    fn pipeline(name: &str) -> TaskGraph {
        let mut graph = TaskGraph::new();
        let gather = graph.add_node(TaskNode::new(name, "Gather", 0)).unwrap();
        let split = graph.add_node(TaskNode::new(name, "FrequencySplit", 0)).unwrap();
        let grid = graph.add_node(TaskNode::new(name, "Grid", 0)).unwrap();
        graph.add_edge(split, grid, 0.0, None).unwrap();
        graph.add_edge(grid, gather, 0.0, None).unwrap();
        graph
    }

    fn workflows(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pipelines_chained_in_declared_order() {
        let graphs: HashMap<String, TaskGraph> = ["A", "B", "C"].iter().map(|n| (n.to_string(), pipeline(n))).collect();

        let merged = concatenate_workflows(graphs, &workflows(&["B", "A", "C"])).unwrap();

        assert_eq!(merged.node_count(), 9);
        assert_eq!(merged.edge_count(), 8);
        let joins: Vec<(String, String)> = merged
            .edges()
            .iter()
            .filter(|e| e.data_product.is_none() && merged.node(e.source).unwrap().pipeline != merged.node(e.target).unwrap().pipeline)
            .map(|e| (merged.node(e.source).unwrap().label(), merged.node(e.target).unwrap().label()))
            .collect();
        assert_eq!(joins, vec![("B_Gather_0".to_string(), "A_FrequencySplit_0".to_string()), ("A_Gather_0".to_string(), "C_FrequencySplit_0".to_string())]);

        let order: Vec<String> = merged.topological_order().unwrap().into_iter().map(|id| merged.node(id).unwrap().pipeline.clone()).collect();
        let first_a = order.iter().position(|p| p == "A").unwrap();
        let last_b = order.iter().rposition(|p| p == "B").unwrap();
        let last_a = order.iter().rposition(|p| p == "A").unwrap();
        let first_c = order.iter().position(|p| p == "C").unwrap();
        assert!(last_b < first_a && last_a < first_c);
    }

    #[test]
    fn test_duplicate_pipeline_is_rejected() {
        let graphs: HashMap<String, TaskGraph> = [("A".to_string(), pipeline("A"))].into_iter().collect();
        assert!(matches!(concatenate_workflows(graphs, &workflows(&["A", "A"])), Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_missing_graph_is_rejected() {
        let graphs: HashMap<String, TaskGraph> = [("A".to_string(), pipeline("A"))].into_iter().collect();
        assert!(matches!(concatenate_workflows(graphs, &workflows(&["A", "B"])), Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_single_pipeline_is_unchanged() {
        let graphs: HashMap<String, TaskGraph> = [("A".to_string(), pipeline("A"))].into_iter().collect();
        let merged = concatenate_workflows(graphs, &workflows(&["A"])).unwrap();
        assert_eq!((merged.node_count(), merged.edge_count()), (3, 2));
    }
}
