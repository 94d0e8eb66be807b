mod imprint;
mod input;
mod output;
pub(crate) mod settings;

pub use imprint::{write_footer, write_header};
pub use input::*;
pub use output::{write_dielectric_function, write_dielectric_tensor};
pub use settings::Configuration;
