//! Extraction, aggregation, ordering and layout engine.
//!
//! Pure domain logic: spreadsheet rows go in through [`workbook::WorkbookSource`],
//! placement commands come out through [`diagram::DiagramSink`]. No file,
//! network or async I/O lives in this crate.
//!
//! Stage order: [`matcher`] -> [`aggregation`] -> [`priority`] ->
//! [`terminals`] -> [`layout`].

pub mod aggregation;
pub mod diagram;
pub mod error;
pub mod layout;
pub mod matcher;
pub mod model;
pub mod priority;
pub mod rules;
pub mod terminals;
pub mod types;
pub mod workbook;
