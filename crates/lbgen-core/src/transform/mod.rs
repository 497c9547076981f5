pub mod controller;
pub mod filter;
pub mod namespace;
pub mod visit;

pub use controller::{ControllerId, ControllerNaming, resolve_controller_ids};
pub use filter::{FilterOptions, FilterRule, RuleSet, filter_document};
pub use namespace::{NamespacePolicy, rewrite_namespace};
