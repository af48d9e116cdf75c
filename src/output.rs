//! Data model for generated study packages.
//!
//! The types double as the wire format: the model is asked to produce this
//! exact JSON shape, the normalizer deserializes into it, and the HTTP layer
//! serializes it back out unchanged.
//!
//! Deserialization is deliberately lenient. Language models routinely omit
//! sections or emit `null` for them; every optional field therefore falls
//! back to its empty value. Only the two top-level sections the pipeline
//! cannot invent (`flashcards` and `revision`) are mandatory.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Input of one generation call. Ephemeral: built per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub source_text: String,
    pub flashcard_count: usize,
    pub qcm_count: usize,
    /// Image references (URLs) extracted beforehand, in page order.
    pub images: Vec<String>,
}

impl GenerationRequest {
    /// Create a request without images. Counts are clamped to at least 1.
    pub fn new(source_text: impl Into<String>, flashcard_count: usize, qcm_count: usize) -> Self {
        Self {
            source_text: source_text.into(),
            flashcard_count: flashcard_count.max(1),
            qcm_count: qcm_count.max(1),
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

/// A question/answer pair, optionally illustrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(default, deserialize_with = "null_as_default")]
    pub question: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer: String,
    /// Always present on the wire; `""` stands for "no image".
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        serialize_with = "none_as_empty"
    )]
    pub image: Option<String>,
}

/// A multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcmQuestion {
    #[serde(default, deserialize_with = "null_as_default")]
    pub question: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    /// Index into `options`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub correct: usize,
}

impl QcmQuestion {
    /// The text of the correct option, if the index is in range.
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct).map(String::as_str)
    }
}

/// A term and its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDefinition")]
pub struct Definition {
    pub term: String,
    pub definition: String,
}

/// Shapes a model uses for a definition entry.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDefinition {
    Pair {
        #[serde(default, deserialize_with = "null_as_default")]
        term: String,
        #[serde(default, deserialize_with = "null_as_default")]
        definition: String,
    },
    Text(String),
}

impl From<RawDefinition> for Definition {
    fn from(raw: RawDefinition) -> Self {
        match raw {
            RawDefinition::Pair { term, definition } => Definition { term, definition },
            RawDefinition::Text(term) => Definition {
                term,
                definition: String::new(),
            },
        }
    }
}

/// Structured long-form study document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSheet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub introduction: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub definitions: Vec<Definition>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub methodology: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub examples: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub practical_applications: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_points: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub must_know: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conclusion: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tips: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub structure: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
}

/// A complete study package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub flashcards: Vec<Flashcard>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub qcm: Vec<QcmQuestion>,
    pub revision: RevisionSheet,
}

/// Token accounting reported by the model API, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// What a successful generation returns: the package plus anything the
/// pipeline had to repair along the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOutput {
    #[serde(flatten)]
    pub result: GenerationResult,
    /// Human-readable note about truncation or repairs. Non-fatal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip)]
    pub usage: Option<TokenUsage>,
}

// ── serde helpers ────────────────────────────────────────────────────────

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn none_as_empty<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_clamps_counts() {
        let r = GenerationRequest::new("text", 0, 0);
        assert_eq!(r.flashcard_count, 1);
        assert_eq!(r.qcm_count, 1);
        assert!(r.images.is_empty());
    }

    #[test]
    fn flashcard_image_wire_format() {
        let card: Flashcard =
            serde_json::from_value(json!({ "question": "Q?", "answer": "A", "image": "" }))
                .unwrap();
        assert_eq!(card.image, None);
        let back = serde_json::to_value(&card).unwrap();
        assert_eq!(back["image"], "");

        let card: Flashcard = serde_json::from_value(json!({ "question": "Q?", "answer": "A" }))
            .unwrap();
        assert_eq!(card.image, None);
    }

    #[test]
    fn revision_tolerates_missing_and_null_fields() {
        let sheet: RevisionSheet = serde_json::from_value(json!({
            "title": "Photosynthesis",
            "summary": null,
            "key_points": ["light", "chlorophyll"],
            "tips": null
        }))
        .unwrap();
        assert_eq!(sheet.title, "Photosynthesis");
        assert_eq!(sheet.summary, "");
        assert_eq!(sheet.key_points.len(), 2);
        assert!(sheet.tips.is_empty());
        assert!(sheet.definitions.is_empty());
    }

    #[test]
    fn definition_accepts_pair_or_text() {
        let defs: Vec<Definition> = serde_json::from_value(json!([
            { "term": "Cell", "definition": "Basic unit of life" },
            "Osmosis"
        ]))
        .unwrap();
        assert_eq!(defs[0].term, "Cell");
        assert_eq!(defs[0].definition, "Basic unit of life");
        assert_eq!(defs[1].term, "Osmosis");
        assert_eq!(defs[1].definition, "");
    }

    #[test]
    fn result_requires_flashcards_and_revision() {
        let missing_revision = json!({ "flashcards": [], "qcm": [] });
        assert!(serde_json::from_value::<GenerationResult>(missing_revision).is_err());

        let missing_qcm = json!({ "flashcards": [], "revision": {} });
        let result: GenerationResult = serde_json::from_value(missing_qcm).unwrap();
        assert!(result.qcm.is_empty());
    }

    #[test]
    fn output_flattens_result_and_omits_empty_warning() {
        let output = GenerationOutput {
            result: GenerationResult {
                flashcards: vec![],
                qcm: vec![],
                revision: RevisionSheet::default(),
            },
            warning: None,
            usage: Some(TokenUsage::default()),
        };
        let v = serde_json::to_value(&output).unwrap();
        assert!(v.get("flashcards").is_some());
        assert!(v.get("revision").is_some());
        assert!(v.get("warning").is_none());
        assert!(v.get("usage").is_none());
    }

    #[test]
    fn correct_option_lookup() {
        let q = QcmQuestion {
            question: "2+2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "22".into()],
            correct: 1,
        };
        assert_eq!(q.correct_option(), Some("4"));
        let out_of_range = QcmQuestion { correct: 9, ..q };
        assert_eq!(out_of_range.correct_option(), None);
    }
}
