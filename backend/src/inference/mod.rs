pub mod artifact;
pub mod model;
pub mod pipeline;
pub mod preprocess;
