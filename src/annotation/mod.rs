pub mod builder;
pub mod io;

pub use builder::AnnotationBuilder;
pub use io::{open_bufread, AnnotationReader, AnnotationRecord, Dialect, ParseError};
