pub mod concatenate;
pub mod expander;
pub mod physical_graph;
pub mod task_graph;
pub mod template;
