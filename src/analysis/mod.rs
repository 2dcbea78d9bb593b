pub mod completion;
pub mod deadline;
pub mod labels;
pub mod ranking;
pub mod score;
pub mod sources;
pub mod successors;
pub mod summary;
