//! Document Model - content tree of a stampable document
//!
//! Each document part stores its nodes in a flat arena keyed by stable
//! [`NodeId`]s. Containers own ordered lists of child ids; parents are found
//! by walking down from the part root.

mod node;
mod node_id;
mod error;
mod run;
mod paragraph;
pub mod table;
mod marker;
mod comment;
mod tree;
mod document;
mod builder;

pub use node::*;
pub use node_id::*;
pub use error::*;
pub use run::*;
pub use paragraph::*;
pub use table::*;
pub use marker::*;
pub use comment::*;
pub use tree::*;
pub use document::*;
