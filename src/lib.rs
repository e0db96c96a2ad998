//! Converts draw.io-flavored SVGs, which embed rich-text labels as
//! HTML-in-SVG foreignObject containers, into pure SVG text elements that
//! dashboard renderers such as ha-floorplan can display.

pub mod convert;
pub mod dom;
pub mod geometry;
pub mod rewrite;
pub mod style;

pub use convert::{convert_document, ConversionResult};
pub use dom::{Document, NamespaceConfig};
