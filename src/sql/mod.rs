//! Safe SQL builder: identifiers quoted, values as parameters; plus runtime value conversion.

mod builder;
pub mod convert;
pub mod params;
pub use builder::*;
pub use convert::{extract_date, is_date_only, to_native, to_wire, try_to_native, ColumnType};
pub use params::SqlValue;
