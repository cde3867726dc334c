//! Pipeline stages for document conversion.
//!
//! Each submodule implements exactly one step, so each is testable without
//! the others and the converter can be swapped for a fake.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pandoc ──▶ normalize ──┐
//! (format)  (subprocess) (fold)     ├──▶ { metadata, document }
//! metadata ────────────────────────┘
//! (stat + YAML header)
//! ```
//!
//! 1. [`input`]     : map the extension to a pandoc reader, read source text
//! 2. [`pandoc`]    : run the external converter; the only stage with
//!    subprocess I/O
//! 3. [`normalize`] : fold runs of text leaves in the returned tree
//! 4. [`metadata`]  : timestamps, filename and header-block fields

pub mod input;
pub mod metadata;
pub mod normalize;
pub mod pandoc;
