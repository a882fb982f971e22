//! Source resolution for form PDFs

pub mod resolver;

pub use resolver::{resolve_path, FormSource};
