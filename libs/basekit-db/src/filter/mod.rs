//! Declarative filtering: field descriptors, input values and the
//! `field__op` compiler.

mod compile;
mod fields;
mod kind;
mod values;

pub use compile::{FilterOp, OP_SEPARATOR, OrderBy, and_all, compile, compile_exact, split_key};
pub use fields::{Field, FieldMap};
pub use kind::FieldKind;
pub use values::{Filters, Values};
