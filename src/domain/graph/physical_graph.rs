use std::collections::{BTreeMap, HashMap};

use crate::api::pgt_dto::PgtElementDto;
use crate::domain::graph::task_graph::{TaskGraph, TaskNode};
use crate::domain::utils::id::DataProductId;
use crate::error::{Error, Result};

/// An application drop: the `index`-th instance of `component`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalTask {
    pub component: String,
    pub index: usize,
}

/// Output of one producer through one data drop, fanned out to the drop's consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct DataProduct {
    /// `{component}_out_{n}`, numbered per producing component.
    pub name: String,
    pub producer: usize,
    pub consumers: Vec<usize>,
}

/// Instance count and number of outgoing data products of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentMultiplicity {
    pub instances: usize,
    pub out_edges: usize,
}

/// Structure of an unrolled graph template, independent of the pipeline it is used for.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhysicalGraph {
    tasks: Vec<PhysicalTask>,
    data_products: Vec<DataProduct>,
    multiplicity: BTreeMap<String, ComponentMultiplicity>,
}

impl PhysicalGraph {
    /// Builds the graph from unroller output. Instance indices and data product numbers
    /// are per-component counters in document order.
    pub fn from_elements(elements: &[PgtElementDto]) -> Result<Self> {
        let mut graph = PhysicalGraph::default();
        let mut by_oid: HashMap<&str, usize> = HashMap::new();

        for element in elements.iter().filter(|e| e.is_app()) {
            let oid = element.oid.as_deref().ok_or_else(|| Error::GraphError("Application drop without oid".to_string()))?;
            let component = element.nm.clone().unwrap_or_else(|| oid.to_string());

            let entry = graph.multiplicity.entry(component.clone()).or_default();
            let index = entry.instances;
            entry.instances += 1;

            by_oid.insert(oid, graph.tasks.len());
            graph.tasks.push(PhysicalTask { component, index });
        }

        let resolve = |reference: Option<&str>, data_oid: &str| -> Result<usize> {
            reference
                .and_then(|oid| by_oid.get(oid).copied())
                .ok_or_else(|| Error::GraphError(format!("Data drop '{}' references unknown application '{}'", data_oid, reference.unwrap_or("?"))))
        };

        for element in elements.iter().filter(|e| e.is_data()) {
            let data_oid = element.oid.as_deref().unwrap_or("?");
            let consumers = element.consumers.iter().flatten().map(|c| resolve(c.oid(), data_oid)).collect::<Result<Vec<_>>>()?;

            for producer in element.producers.iter().flatten() {
                let producer = resolve(producer.oid(), data_oid)?;
                let component = &graph.tasks[producer].component;

                let entry = graph.multiplicity.entry(component.clone()).or_default();
                let name = format!("{}_out_{}", component, entry.out_edges);
                entry.out_edges += 1;

                graph.data_products.push(DataProduct { name, producer, consumers: consumers.clone() });
            }
        }

        Ok(graph)
    }

    pub fn tasks(&self) -> &[PhysicalTask] {
        &self.tasks
    }

    pub fn data_products(&self) -> &[DataProduct] {
        &self.data_products
    }

    pub fn multiplicity(&self, component: &str) -> Option<ComponentMultiplicity> {
        self.multiplicity.get(component).copied()
    }

    /// Component name to multiplicity, sorted by name.
    pub fn multiplicity_table(&self) -> &BTreeMap<String, ComponentMultiplicity> {
        &self.multiplicity
    }

    /// Task graph with nodes `{pipeline}_{component}_{index}` and one edge per distinct
    /// producer/consumer pair, labelled with the first data product connecting them.
    pub fn to_task_graph(&self, pipeline: &str) -> Result<TaskGraph> {
        let mut graph = TaskGraph::new();
        let ids = self
            .tasks
            .iter()
            .map(|task| graph.add_node(TaskNode::new(pipeline, task.component.as_str(), task.index)))
            .collect::<Result<Vec<_>>>()?;

        for product in &self.data_products {
            for &consumer in &product.consumers {
                let data_product = DataProductId::new(format!("{}_{}", pipeline, product.name));
                graph.add_edge(ids[product.producer], ids[consumer], 0.0, Some(data_product))?;
            }
        }

        Ok(graph)
    }
}
