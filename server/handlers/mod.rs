pub mod predict;
pub mod static_files;
