pub mod types;

pub use types::{Defect, Field, RowError};
