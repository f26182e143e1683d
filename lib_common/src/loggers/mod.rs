/// File and stderr logging built on `fern`.
pub mod loggerlocal;

pub use loggerlocal::{parse_level, setup_logging};
