use thiserror::Error;

use crate::element::ElementId;
use crate::hooks::Phase;

#[derive(Error, Debug)]
pub enum RenderError {
    /// A deferred element (or replacement) failed to produce an element.
    #[error("deferred element failed to resolve: {0}")]
    Deferred(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The element an operation targets is not in the document.
    #[error("element '{0}' is not in the document")]
    ElementNotFound(ElementId),

    /// The attach strategy returned without placing the element.
    #[error("element '{0}' was not attached to the document")]
    NotAttached(ElementId),

    /// One or more lifecycle hooks failed. All hooks of the phase settled
    /// before this was returned.
    #[error("{failed} of {total} {phase} hooks failed; first failure on '{element}': {source}")]
    Hook {
        phase: Phase,
        element: ElementId,
        failed: usize,
        total: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, RenderError>;
