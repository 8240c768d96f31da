mod cache_record;
mod common;
mod extraction;
mod source_file;

pub use cache_record::*;
pub use common::*;
pub use extraction::*;
pub use source_file::*;
