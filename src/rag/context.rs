//! Context assembly from retrieved documents

use crate::vector_store::RetrievedDocument;

/// Label placed before each document; the prompt asks the model to cite it
pub const DOCUMENT_LABEL: &str = "Documento";

const SEPARATOR: &str = "\n\n";

/// Renders retrieved documents into the context block of the prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler;

impl ContextAssembler {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Label each document with its 1-based position and join them with a
    /// blank line, keeping the retrieval order. Nothing is truncated.
    #[must_use]
    pub fn assemble(&self, documents: &[RetrievedDocument]) -> String {
        documents
            .iter()
            .enumerate()
            .map(|(idx, doc)| format!("{DOCUMENT_LABEL}: {}\n{}", idx + 1, doc.content))
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }
}
