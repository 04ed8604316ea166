//! Reading tests - values, streaming, tables and reference lookup.

mod lookup;
mod metadata;
mod streaming;
mod tables;
