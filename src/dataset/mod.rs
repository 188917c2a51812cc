//! Dataset loading, synthesis, and schema resolution.

pub mod loader;
pub mod schema;
pub mod synthetic;
pub mod table;

pub use loader::{DatasetError, load, parse_csv};
pub use schema::{FeatureSpec, SchemaError, resolve};
pub use table::{CellValue, DataTable};
