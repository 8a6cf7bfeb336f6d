pub mod common;
pub mod python;

pub use common::{ImportName, ImportStatement, ParseFailure};
pub use python::PythonFrontend;
