pub mod db;
pub mod import;
pub mod scoring;
pub mod settings;
pub mod successors;
