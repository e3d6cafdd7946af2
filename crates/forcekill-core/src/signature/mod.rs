mod pattern;
mod table;
mod version;

pub use pattern::*;
pub use table::*;
pub use version::*;
