//! Convenient imports for typical `pginsert` usage.
//!
//! ```ignore
//! use pginsert::prelude::*;
//! ```

pub use crate::{Compiler, CompilerConfig, Fragment, InsertQuery, OrmError, OrmResult, Value};

// Trait and derive macro share the name `Record`.
pub use crate::record::Record;

#[cfg(feature = "derive")]
pub use pginsert_derive::Record;

#[cfg(feature = "postgres")]
pub use crate::GenericClient;
