mod infinite_list;

pub use infinite_list::*;
