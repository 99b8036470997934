pub mod bar;
pub mod candidate;
pub mod evaluation;
