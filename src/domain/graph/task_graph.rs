use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use slotmap::{SlotMap, new_key_type};

use crate::api::workflow_file_dto::{LinkDto, NodeDto, NodeLinkGraphDto};
use crate::domain::utils::id::DataProductId;
use crate::error::{Error, Result};

new_key_type! {
    pub struct TaskId;
}

/// One task instance of a pipeline component.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNode {
    pub pipeline: String,
    pub component: String,
    pub index: usize,
    /// FLOPs.
    pub comp: f64,
    /// Bytes.
    pub task_data: f64,
}

impl TaskNode {
    pub fn new(pipeline: impl Into<String>, component: impl Into<String>, index: usize) -> Self {
        TaskNode { pipeline: pipeline.into(), component: component.into(), index, comp: 0.0, task_data: 0.0 }
    }

    /// `{pipeline}_{component}_{index}`, the node id in workflow files.
    pub fn label(&self) -> String {
        format!("{}_{}_{}", self.pipeline, self.component, self.index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskEdge {
    pub source: TaskId,
    pub target: TaskId,
    /// Bytes.
    pub transfer_data: f64,
    /// Data product the dependency was derived from; `None` for synthetic edges.
    pub data_product: Option<DataProductId>,
}

/// Directed task graph with deterministic (insertion) ordering of nodes and edges.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    nodes: SlotMap<TaskId, TaskNode>,
    order: Vec<TaskId>,
    edges: Vec<TaskEdge>,

    label_index: HashMap<String, TaskId>,
    edge_index: HashSet<(TaskId, TaskId)>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: TaskNode) -> Result<TaskId> {
        let label = node.label();
        if self.label_index.contains_key(&label) {
            return Err(Error::GraphError(format!("Duplicate task '{}'", label)));
        }

        let id = self.nodes.insert(node);
        self.order.push(id);
        self.label_index.insert(label, id);
        Ok(id)
    }

    /// Adds `source -> target`. A second edge between the same pair is ignored and
    /// `false` is returned.
    pub fn add_edge(&mut self, source: TaskId, target: TaskId, transfer_data: f64, data_product: Option<DataProductId>) -> Result<bool> {
        if !self.nodes.contains_key(source) || !self.nodes.contains_key(target) {
            return Err(Error::GraphError("Edge references a task that is not part of the graph".to_string()));
        }
        if !self.edge_index.insert((source, target)) {
            return Ok(false);
        }

        self.edges.push(TaskEdge { source, target, transfer_data, data_product });
        Ok(true)
    }

    pub fn node(&self, id: TaskId) -> Option<&TaskNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: TaskId) -> Option<&mut TaskNode> {
        self.nodes.get_mut(id)
    }

    pub fn find(&self, label: &str) -> Option<TaskId> {
        self.label_index.get(label).copied()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (TaskId, &TaskNode)> + '_ {
        self.order.iter().filter_map(move |&id| self.nodes.get(id).map(|node| (id, node)))
    }

    pub fn node_ids(&self) -> &[TaskId] {
        &self.order
    }

    pub fn edges(&self) -> &[TaskEdge] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut [TaskEdge] {
        &mut self.edges
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn out_degree(&self, id: TaskId) -> usize {
        self.edges.iter().filter(|e| e.source == id).count()
    }

    pub fn total_comp(&self) -> f64 {
        self.nodes().map(|(_, n)| n.comp).sum()
    }

    /// Bytes held by nodes plus bytes moved along edges.
    pub fn total_data(&self) -> f64 {
        self.nodes().map(|(_, n)| n.task_data).sum::<f64>() + self.edges.iter().map(|e| e.transfer_data).sum::<f64>()
    }

    /// Kahn's algorithm; among ready nodes the earliest inserted goes first.
    pub fn topological_order(&self) -> Result<Vec<TaskId>> {
        let position: HashMap<TaskId, usize> = self.order.iter().enumerate().map(|(pos, &id)| (id, pos)).collect();
        let mut in_degree = vec![0usize; self.order.len()];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); self.order.len()];

        for edge in &self.edges {
            let (source, target) = (position[&edge.source], position[&edge.target]);
            successors[source].push(target);
            in_degree[target] += 1;
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree.iter().enumerate().filter(|(_, d)| **d == 0).map(|(pos, _)| Reverse(pos)).collect();
        let mut sorted = Vec::with_capacity(self.order.len());

        while let Some(Reverse(pos)) = ready.pop() {
            sorted.push(self.order[pos]);
            for &next in &successors[pos] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if sorted.len() != self.order.len() {
            return Err(Error::GraphError(format!("Task graph contains a cycle ({} of {} tasks sortable)", sorted.len(), self.order.len())));
        }
        Ok(sorted)
    }

    /// Moves all nodes and edges of `other` into this graph.
    pub fn absorb(&mut self, other: TaskGraph) -> Result<()> {
        let mut mapping = HashMap::with_capacity(other.order.len());
        let TaskGraph { mut nodes, order, edges, .. } = other;

        for id in order {
            if let Some(node) = nodes.remove(id) {
                mapping.insert(id, self.add_node(node)?);
            }
        }
        for edge in edges {
            let (Some(&source), Some(&target)) = (mapping.get(&edge.source), mapping.get(&edge.target)) else {
                return Err(Error::GraphError("Absorbed graph has an edge to a missing task".to_string()));
            };
            self.add_edge(source, target, edge.transfer_data, edge.data_product)?;
        }
        Ok(())
    }

    pub fn to_node_link_dto(&self) -> NodeLinkGraphDto {
        let label = |id: TaskId| self.nodes.get(id).map(TaskNode::label).unwrap_or_default();

        NodeLinkGraphDto {
            directed: true,
            multigraph: false,
            graph: serde_json::Map::new(),
            nodes: self.nodes().map(|(_, n)| NodeDto { id: n.label(), comp: n.comp, task_data: n.task_data }).collect(),
            links: self
                .edges
                .iter()
                .map(|e| LinkDto {
                    source: label(e.source),
                    target: label(e.target),
                    transfer_data: e.transfer_data,
                    data_product: e.data_product.as_ref().map(|dp| dp.to_string()),
                })
                .collect(),
        }
    }
}
