//! Context-enrichment adapters.
//!
//! Each adapter is independently optional and failure-tolerant: a timeout, a
//! non-2xx status, or a malformed body all degrade to "no contribution" and
//! never block or fail the user-visible turn. Adapters have no ordering
//! dependency on each other and are issued concurrently; only the generation
//! call depends on their completion.

pub mod http;
pub mod pipeline;

pub use http::HttpClassifier;
pub use pipeline::EnrichmentPipeline;
