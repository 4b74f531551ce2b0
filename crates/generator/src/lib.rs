mod accumulator;
mod config;
mod coordinator;
mod ids;
mod partition;
mod report;
mod single;

pub use accumulator::BatchAccumulator;
pub use config::{Collections, MAX_CONCURRENCY, RunConfig, WriteMode};
pub use coordinator::run;
pub use ids::{BatchIdSource, RunIds, SequenceCounter};
pub use partition::partition;
pub use report::{RunReport, WorkerReport};
pub use single::SingleWriter;
