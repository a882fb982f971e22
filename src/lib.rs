//! pdftk-forms Library
//!
//! This crate inspects and fills PDF forms by driving the `pdftk` executable:
//! - `fields`: list a form's fields with their type, value and state options
//! - `fill`: merge field values into a form, optionally setting document info
//!   and flattening, and stream the resulting PDF

pub mod error;
pub mod forms;
pub mod pdftk;
pub mod source;
pub mod xfdf;

pub use error::{Error, ErrorKind, Result};
pub use forms::{fields, fill, FillOptions, PdfForms};
pub use pdftk::{
    DocumentInfo, FieldDescriptor, FieldMap, FilledPdf, InfoKey, InfoValue, PdftkConfig,
};
pub use xfdf::{FieldValue, FieldValues};
