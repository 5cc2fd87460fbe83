//! Variable stores, scope chain resolution, and placeholder substitution.

pub mod scope;
pub mod store;
pub mod substitution;

pub use scope::ScopeChain;
pub use store::{StoreKind, VariableStore};
pub use substitution::{apply_to_request, replace_in};
