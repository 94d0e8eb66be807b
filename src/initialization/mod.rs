pub use input_check::input_check;
pub use system::*;

mod input_check;
pub mod system;
