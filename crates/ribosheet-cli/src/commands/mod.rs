pub mod analyze;
pub mod simulate;
