pub mod common;
pub mod image;
pub mod records;
pub mod task;

pub use common::*;
pub use image::*;
pub use records::*;
pub use task::*;
