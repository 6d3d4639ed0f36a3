//! Thought node store: arena of [`ThoughtNode`]s keyed by [`NodeId`].

mod node;
mod snapshot;
mod store;

pub use node::{NodeId, NodeStatus, ThoughtNode};
pub use snapshot::TreeSnapshot;
pub use store::NodeStore;
