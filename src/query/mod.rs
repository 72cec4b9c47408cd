//! Query descriptors and their identities.
//!
//! A live query is a collection name plus a [`QueryDescriptor`]. Bindings
//! never compare descriptors directly; they compare the [`QueryIdentity`]
//! returned by [`resolve`], which is derived from the descriptor's content.

mod descriptor;
mod eval;
mod identity;

pub use descriptor::{equals, limit, order_by, Clause, FieldValue, QueryDescriptor, SortDirection};
pub use eval::{apply, matches};
pub use identity::{resolve, QueryIdentity};

pub(crate) use identity::validate_collection;
