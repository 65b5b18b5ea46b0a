//! Reads and writes ADM documents.
//!
//! Reading is split into the [tokenizer](tokenizer) which takes care of the XML syntax and the
//! [reader](reader) which maps elements and attributes onto the entity graph. Writing walks the
//! graph via the [writer](writer) and emits the result into the chunks provided by an
//! [output](output) sink.
pub mod lines;
pub mod output;
pub mod reader;
pub mod tokenizer;
pub mod writer;
