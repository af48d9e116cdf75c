//! Prompts for study-package generation.
//!
//! Every prompt lives here so a wording change touches exactly one place and
//! unit tests can inspect the prompt without calling a model. Callers can
//! override the system message via
//! [`crate::config::GenerationConfig::system_prompt`]; the user prompt is
//! always built by [`build_prompt`] because it carries the output contract
//! the normalizer relies on.

/// System message sent ahead of every generation prompt.
pub const SYSTEM_PROMPT: &str = "You are an expert educational assistant who builds detailed, \
structured and visual revision material. You use relevant emojis to make the content engaging \
and you organise information the way a real teacher would. You follow the instructions about \
the number of items to generate scrupulously, and you always answer with a single JSON object.";

/// Exact JSON shape the model must return. Field names match
/// [`crate::output::GenerationResult`].
pub const OUTPUT_SHAPE: &str = r#"{
  "flashcards": [
    {"question": "Question 1?", "answer": "Answer 1", "image": ""}
  ],
  "qcm": [
    {
      "question": "Question 1?",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correct": 0
    }
  ],
  "revision": {
    "title": "Full title of the subject with an emoji",
    "introduction": "Introductory paragraphs explaining the context and why the subject matters",
    "summary": "Detailed summary of the main concepts",
    "definitions": [
      {"term": "Term 1", "definition": "Detailed definition 1"},
      {"term": "Term 2", "definition": "Detailed definition 2"}
    ],
    "methodology": "Methods or processes related to the subject",
    "examples": ["Detailed example 1", "Detailed example 2"],
    "practical_applications": "How to apply this knowledge in practice",
    "key_points": ["Key point 1 🔑", "Key point 2 🔑"],
    "must_know": ["Essential item 1 🌟", "Essential item 2 🌟"],
    "conclusion": "Final synthesis and outlook",
    "tips": ["Revision tip 1", "Revision tip 2"],
    "structure": ["Section 1", "Section 2"],
    "images": []
  }
}"#;

/// Build the user prompt for one generation call.
///
/// `image_count` is mentioned as context only. Image URLs are never put in
/// the prompt: models mangle or invent links, so extracted images are spliced
/// into the result afterwards by the normalizer.
pub fn build_prompt(
    source_text: &str,
    flashcard_count: usize,
    qcm_count: usize,
    image_count: usize,
) -> String {
    let image_info = if image_count > 0 {
        format!(
            "\n\nINFORMATION: {image_count} images were extracted from the document. \
They will be added after generation; do not reference or invent image URLs."
        )
    } else {
        String::new()
    };

    format!(
        r#"You are an assistant specialised in building detailed, visual revision material. Here is the content to turn into complete study material:

"{source_text}"

IMPORTANT: You must produce EXACTLY {flashcard_count} flashcards, no more and no less. This is an absolute requirement.

Create:
1. EXACTLY {flashcard_count} flashcards with a question on the front and the answer on the back.
2. {qcm_count} multiple-choice questions, each with 4 options and a single correct answer.
3. A DETAILED revision sheet of the content (1-2 full pages), including:
   - A catchy title with an emoji
   - An introduction presenting the subject (2-3 paragraphs)
   - A structured summary of the main concepts
   - A "Key definitions" section with at least 5-10 important terms
   - A "Methodology" or "Steps" section where relevant
   - Concrete examples illustrating the concepts
   - A "Practical applications" section
   - Points that must be remembered (5-10 essential points)
   - A conclusion that brings the main ideas together (1-2 paragraphs){image_info}

IMPORTANT INSTRUCTIONS:
- Use relevant emojis in section titles and key points (🔑, 📝, 📊, 🔍, 🧠, etc.)
- Format text with headings, sub-headings, bullet lists and tables where relevant
- Structure the revision sheet like a real teaching document, not a plain list
- Include concrete methodological advice for revising the subject effectively

Format your answer as JSON with this exact structure:
{shape}

Before answering, check that your flashcards array contains exactly {flashcard_count} items and that your revision sheet is truly detailed and structured like a complete teaching document.
"#,
        shape = OUTPUT_SHAPE,
    )
}
