//! Engine adapters for the product index.
//!
//! `elastic` speaks the engine's REST API; `memory` keeps documents in
//! process and is what the CLI's `memory` backend and the tests run on.

pub mod analysis;
pub mod elastic;
pub mod memory;

pub use elastic::ElasticIndex;
pub use memory::MemoryIndex;
