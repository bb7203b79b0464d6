pub mod command;
pub mod error;

pub use command::{Command, QUIT};
pub use error::{Result, SupplierError};
