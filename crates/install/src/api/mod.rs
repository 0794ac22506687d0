pub mod collaborators;
pub mod context;
pub mod result;
