//! Instruction template wrapped around each fragment

use std::path::Path;

use crate::config::ConfigError;

const HTML_PLACEHOLDER: &str = "{html_text}";
const FORMAT_PLACEHOLDER: &str = "{format_instructions}";

const DEFAULT_TEMPLATE: &str = "\
Eres un asistente que extrae eventos de páginas web de un museo de ciencia.
A continuación tienes un fragmento HTML con el listado de eventos de una sección.
Extrae todos los eventos que aparecen en él, sin inventar ninguno.
Para cada evento indica su nombre, fechas de inicio y fin, descripción, precio y tipo.
Si una fecha no aparece, déjala vacía. Si el evento es gratuito o no indica precio, el precio es 0.

{format_instructions}

Fragmento HTML:
{html_text}
";

/// Prompt template with `{html_text}` and optional `{format_instructions}` slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, ConfigError> {
        let template = template.into();
        if !template.contains(HTML_PLACEHOLDER) {
            return Err(ConfigError::Invalid(format!(
                "prompt template must contain the {} placeholder",
                HTML_PLACEHOLDER
            )));
        }
        Ok(Self { template })
    }

    /// Read a template from disk
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let template = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::new(template)
    }

    /// Fill the template. The fragment is substituted last so markup that
    /// happens to contain a placeholder is left untouched.
    pub fn render(&self, format_instructions: &str, html_text: &str) -> String {
        self.template
            .replace(FORMAT_PLACEHOLDER, format_instructions)
            .replace(HTML_PLACEHOLDER, html_text)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}
