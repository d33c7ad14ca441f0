pub mod string;

pub use string::{display_name, format_quantity, parse_removal_amount};
