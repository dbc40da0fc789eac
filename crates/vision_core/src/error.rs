use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0} rendering is not implemented")]
    NotImplemented(&'static str),
    #[error("class id {class_id} is outside the viewer's {num_classes} classes")]
    UnknownClass { class_id: i32, num_classes: usize },
    #[error("{indices} {what} indices given for {rows} valid detections")]
    MissingIndex {
        what: &'static str,
        indices: usize,
        rows: usize,
    },
    #[error("{0} classes exceed the {max}-color palette", max = crate::palette::COLOR_POOL.len())]
    TooManyClasses(usize),
    #[error("font error at {path}: {reason}")]
    Font { path: PathBuf, reason: String },
}
