//! RESP2 values, request argument encoding and an async reply reader.

mod reader;
mod value;

pub use reader::{RespReader, MAX_BULK_LEN};
pub use value::{RespValue, ToArg};
