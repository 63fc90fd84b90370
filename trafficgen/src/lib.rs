#![deny(clippy::all)]

pub mod catalog;
pub mod orchestrator;
pub mod ports;
pub mod randomizer;
pub mod rpc;
pub mod transport;
pub mod verify;
pub mod worker;
pub mod workload;

pub use catalog::{Catalog, OperationExample};
pub use orchestrator::{Orchestrator, RunSummary};
pub use rpc::CallIdAllocator;
pub use worker::{Worker, WorkerConfig, WorkerReport};
