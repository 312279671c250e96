pub mod classifier;
pub mod frame;
pub mod label_table;
pub mod overlay;
pub mod prediction;
pub mod preprocess;
