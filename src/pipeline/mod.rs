//! The scrape pipeline
//!
//! This module contains the queue-driven task scheduler at the heart of the
//! crawler:
//! - Task and outcome records flowing through the two queues
//! - Producers materializing seed descriptors into tasks
//! - Request workers executing fetches under politeness limits
//! - Response writers persisting extracted documents
//! - The coordinator wiring it all together and draining it cleanly

mod coordinator;
mod metadata;
mod outcome;
mod producer;
mod queue;
mod task;
mod worker;
mod writer;

pub use coordinator::{build_http_client, run_pipeline, Coordinator};
pub use metadata::Metadata;
pub use outcome::{DatasetRecord, Payload, ScrapeOutcome};
pub use producer::{produce_seeds, SeedRequest};
pub use queue::WorkQueue;
pub use task::{Disposition, FetchedResponse, Postmortem, ScrapeTask};
pub use worker::RequestWorker;
pub use writer::ResponseWriter;
