//! Schema handed to the model.
//!
//! The shapes below exist only to describe the expected output. Their doc
//! comments become the field descriptions of the generated JSON Schema, so they
//! are written in the language of the source pages.

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;

/// Lista de eventos extraídos del fragmento.
#[allow(dead_code)]
#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(rename = "EventScrapper")]
struct EventEnvelope {
    /// Lista de todos los eventos listados en el texto.
    #[serde(rename = "Events")]
    events: Vec<EventShape>,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(rename = "Event")]
struct EventShape {
    /// El nombre del evento.
    name: String,

    /// La fecha de inicio del evento, en formato ISO 8601 (AAAA-MM-DDTHH:MM:SS).
    starting_date: Option<String>,

    /// La fecha de finalización del evento, en formato ISO 8601 (AAAA-MM-DDTHH:MM:SS).
    ending_date: Option<String>,

    /// La descripción del evento y sus detalles.
    description: String,

    /// El precio del evento en euros. Si es gratuito o no hay precio, el valor es 0.
    price: Option<f64>,

    /// El tipo de evento. Pueden ser Exposiciones, Actividades, Planetario o
    /// Conferencias. Si son Actividades, pueden ser Talleres, Visitas guiadas,
    /// Espectáculos, Muestra u Otros.
    #[serde(rename = "type")]
    kind: String,
}

/// JSON Schema of the extraction response plus the instructions built from it
#[derive(Debug, Clone)]
pub struct EventSchema {
    schema_json: String,
}

impl EventSchema {
    pub fn new() -> Self {
        let schema = schema_for!(EventEnvelope);
        let schema_json = serde_json::to_string_pretty(&schema).unwrap_or_default();
        Self { schema_json }
    }

    /// The JSON Schema document, pretty-printed
    pub fn as_json(&self) -> &str {
        &self.schema_json
    }

    /// Text substituted for `{format_instructions}` in the prompt template
    pub fn format_instructions(&self) -> String {
        format!(
            "La respuesta debe ser un objeto JSON que cumpla el siguiente JSON Schema.\n\
             Devuelve únicamente el JSON, sin comentarios ni texto adicional.\n\
             Si el texto no contiene eventos, devuelve {{\"Events\": []}}.\n\n\
             ```json\n{}\n```",
            self.schema_json
        )
    }
}

impl Default for EventSchema {
    fn default() -> Self {
        Self::new()
    }
}
