pub mod hardware;
pub mod ingest;
