pub mod category;
pub mod issue;
pub mod score;
pub mod workspace;
