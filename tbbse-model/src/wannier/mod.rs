mod model;
pub mod reader;

pub use model::*;
pub use reader::{read_centres_file, read_hr_file, HoppingBlock};
