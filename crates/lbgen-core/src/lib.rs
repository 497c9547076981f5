pub mod config;
pub mod error;
pub mod parse;
pub mod pipeline;
pub mod transform;

pub use parse::spec::Document;
pub use transform::ControllerId;
