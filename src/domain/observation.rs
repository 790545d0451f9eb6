pub mod factory;
pub mod observation;
