mod overlap;
mod sort;

pub use overlap::overlap;
pub use sort::sort;
