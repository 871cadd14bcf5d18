//! Portfolio simulation: the rebalancing state machine and the benchmark
//! DCA replay.

pub mod benchmark;
pub mod simulator;

pub use benchmark::{replay_dca, BenchmarkPoint};
pub use simulator::{Schedule, SimConfig, SimError, SimResult, Simulator};
