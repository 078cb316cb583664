//! Prompt templates for grounded answers

use crate::errors::RagError;
use crate::errors::Result;

/// Fixed reply the model must give when the context cannot answer the question
pub const INSUFFICIENT_INFORMATION: &str =
    "No tengo suficiente información para responder a esta pregunta.";

/// Template with `{{name}}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill every placeholder in a single pass.
    ///
    /// Substituted values are never scanned again, so a retrieved document
    /// containing `{{question}}` is rendered literally.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String> {
        if let Some(missing) = self
            .variables
            .iter()
            .find(|var| !values.iter().any(|(name, _)| *name == var.as_str()))
        {
            return Err(RagError::Internal(format!(
                "Missing prompt variable: {missing}"
            )));
        }

        let mut output = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find("{{") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let name = &after[..end];
                    match values.iter().find(|(var, _)| *var == name) {
                        Some((_, value)) => output.push_str(value),
                        None => {
                            output.push_str("{{");
                            output.push_str(name);
                            output.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    output.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        output.push_str(rest);

        Ok(output)
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let name = after[..end].to_string();
        if !name.is_empty() && !variables.contains(&name) {
            variables.push(name);
        }
        rest = &after[end + 2..];
    }

    variables
}

/// Instruction template for answering strictly from retrieved context.
///
/// Variables: `context`, `question`.
#[must_use]
pub fn grounded_answer() -> PromptTemplate {
    PromptTemplate::new(format!(
        r#"Eres un asistente útil que responde preguntas basándose únicamente en el contexto proporcionado.

Contexto:
{{{{context}}}}

Pregunta: {{{{question}}}}

Instrucciones importantes:
1. Responde solo con información que esté presente en el contexto proporcionado.
2. Si el contexto no contiene la información necesaria para responder, di "{INSUFFICIENT_INFORMATION}"
3. No uses conocimiento externo o general que no esté en el contexto.
4. Proporciona respuestas detalladas y precisas basadas únicamente en el contexto.
5. Cita las fuentes cuando sea posible, indicando el número de documento (por ejemplo, "Documento: 2").
6. Si hay información contradictoria en el contexto, señálala y explica las diferentes perspectivas.

Respuesta:"#
    ))
}
