pub mod analyzer;
pub mod categories;
pub mod indices;
pub mod range;
pub mod stats;
pub mod table;
