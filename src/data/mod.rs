//! Tabular data structures shared by the similarity and connectivity stages.

mod annotated_matrix;
mod indexed;
mod metadata;

pub use annotated_matrix::AnnotatedMatrix;
pub use indexed::{AxisLabel, IndexedAxis, IndexedMatrix};
pub use metadata::{Metadata, Variable};
