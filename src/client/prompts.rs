//! Prompt builders for the three things the assistant asks the proxy for:
//! the bilingual passage lookup, per-field analysis suggestions, and the
//! specialised hermeneutics/homiletics suggestions.

/// Sermon sections that have a dedicated suggestion prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SermonField {
    HistoricalDistance,
    TheologicalBridge,
    SermonHeart,
    Development,
}

/// Ask for the passage in RVR1960 and NTV as a bare JSON object.
pub fn passage_prompt(passage: &str) -> String {
    format!(
        "Busca el siguiente pasaje bíblico: \"{passage}\". Provee el texto en dos versiones: \
         Reina-Valera 1960 (RVR1960) y Nueva Traducción Viviente (NTV). Formatea tu respuesta \
         estrictamente como un objeto JSON con las claves \"rvr1960\" y \"ntv\". No incluyas nada \
         más en tu respuesta, solo el objeto JSON."
    )
}

/// Generic analysis prompt for one exegesis field, identified by its label.
pub fn field_analysis_prompt(passage: &str, label: &str) -> String {
    let passage = if passage.is_empty() { "seleccionado" } else { passage };
    format!("Para el pasaje {passage}, dame un análisis sobre \"{label}\".")
}

/// Prompt for a field with its own wording. `theological_bridge` is only used
/// by [`SermonField::SermonHeart`].
pub fn field_prompt(field: SermonField, passage: &str, theological_bridge: &str) -> String {
    match field {
        SermonField::HistoricalDistance => format!(
            "Compara la audiencia original de {passage} con una audiencia actual. Enumera \
             similitudes y diferencias clave en cultura, sociedad y tecnología."
        ),
        SermonField::TheologicalBridge => format!(
            "Basado en el análisis de {passage}, extrae el principio teológico central y eterno."
        ),
        SermonField::SermonHeart => format!(
            "Basado en el pasaje {passage} y el principio teológico \"{theological_bridge}\", crea \
             una frase corta, clara e impactante para el corazón del sermón."
        ),
        SermonField::Development => format!(
            "Basado en {passage} y las notas de exégesis, estructura un desarrollo narrativo para \
             un sermón. Sigue la secuencia del pasaje."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passage_prompt_names_both_versions() {
        let prompt = passage_prompt("Juan 3:16");
        assert!(prompt.contains("\"Juan 3:16\""));
        assert!(prompt.contains("\"rvr1960\""));
        assert!(prompt.contains("\"ntv\""));
    }

    #[test]
    fn test_field_analysis_without_passage() {
        assert_eq!(
            field_analysis_prompt("", "Verbos"),
            "Para el pasaje seleccionado, dame un análisis sobre \"Verbos\"."
        );
    }

    #[test]
    fn test_sermon_heart_quotes_bridge() {
        let prompt = field_prompt(SermonField::SermonHeart, "Rut 1", "Dios es fiel");
        assert!(prompt.contains("\"Dios es fiel\""));
        assert!(prompt.starts_with("Basado en el pasaje Rut 1"));
    }
}
