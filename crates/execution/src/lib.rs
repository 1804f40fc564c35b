// In crates/execution/src/lib.rs

use async_trait::async_trait;
use core_types::{Execution, OrderRequest};

pub mod error;
pub mod orders;
pub mod paper;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use orders::{order_for_decision, plan_orders};
pub use paper::PaperExecutor;
pub use types::{Portfolio, SimulationSettings};

/// The universal interface for an order sink.
///
/// An `Executor` is responsible for taking an `OrderRequest` built from an approved
/// risk decision and submitting it to a target, which could be a brokerage account
/// or a paper simulation.
#[async_trait]
pub trait Executor: Send {
    /// The name of the executor (e.g., "PaperExecutor").
    fn name(&self) -> &'static str;

    /// Executes a given order request.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Execution` details on success, or an `Error`
    /// if the order could not be filled.
    async fn execute(&mut self, order: &OrderRequest) -> Result<Execution>;

    /// The fill costs orders should be sized against so that they can be paid for.
    /// Defaults to fills at the reference price with no fee.
    fn cost_model(&self) -> SimulationSettings {
        SimulationSettings::default()
    }

    /// The account state after the fills so far, for executors that track one.
    fn portfolio(&self) -> Option<&Portfolio> {
        None
    }
}
