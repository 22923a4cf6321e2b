//! oncokb-store: Dependency graph of asynchronously resolved remote-data nodes.
//!
//! A [`DataStore`] owns every node of one query context. Nodes are either
//! inputs (set synchronously, always complete) or derived from an async
//! producer plus a list of upstream nodes. Evaluation is lazy: a node's
//! producer starts the first time it is resolved, and only after every
//! upstream has settled.
//!
//! The store never spawns. In-flight producers live inside the store and are
//! driven by [`DataStore::settle`] / [`DataStore::step`] (or drained without
//! waiting by [`DataStore::pump`]) on whatever single-threaded loop owns it.
//!
//! # Example
//!
//! ```rust
//! use oncokb_store::{DataStore, NodeStatus};
//!
//! # futures::executor::block_on(async {
//! let mut store = DataStore::new();
//! let symbol = store.input("symbol", "BRAF".to_string());
//! let lower = store.node("lower", String::new(), &[symbol.id()], move |inputs| async move {
//!     anyhow::Ok(inputs.get(symbol.node())?.to_lowercase())
//! });
//!
//! assert_eq!(store.resolve(lower).status, NodeStatus::Pending);
//! store.settle().await;
//! assert_eq!(store.resolve(lower).value.as_str(), "braf");
//! # });
//! ```

pub mod error;
pub mod graph;
pub mod node;

pub use error::StoreError;
pub use graph::DataStore;
pub use node::{Input, Inputs, Node, NodeId, NodeStatus, Resolved};
