//! pdftk process layer
//!
//! This module drives the pdftk executable and adapts its text protocols:
//! command construction, the field dump parser, document info encoding and
//! the filled-PDF output stream.

mod command;
mod fields;
mod info;
mod output;

pub use command::{PdftkCommand, PdftkConfig, PDFTK_PATH_ENV};
pub use fields::{parse_field_dump, FieldDescriptor, FieldMap};
pub use info::{format_pdf_date, DocumentInfo, InfoKey, InfoValue};
pub use output::FilledPdf;

pub(crate) use output::Stage;
