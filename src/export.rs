//! Export formats for generated study material.
//!
//! * [`to_anki`]: tab-separated lines Anki imports as "Basic" notes with an
//!   optional image field.
//! * [`to_markdown`]: the revision sheet as a Markdown document that note
//!   apps render directly.

use crate::output::{Definition, Flashcard, RevisionSheet};
use std::fmt::Write as _;

/// Image values models emit when they have no real image.
const IMAGE_PLACEHOLDERS: [&str; 2] = ["url_de_l_image", "#"];

const IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

/// Downloadable export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Anki,
    Markdown,
}

impl ExportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Anki => "flashcards_anki.txt",
            ExportFormat::Markdown => "revision_notes.md",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Anki => "text/plain; charset=utf-8",
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
        }
    }
}

/// True when `s` points at something a browser can display.
pub fn is_valid_image_ref(s: &str) -> bool {
    if s.is_empty() || IMAGE_PLACEHOLDERS.contains(&s) {
        return false;
    }
    s.starts_with("http")
        || s.starts_with("/uploads/")
        || s.starts_with("/public/uploads/")
        || (s.starts_with('/') && IMAGE_EXTENSIONS.iter().any(|ext| s.ends_with(ext)))
}

fn anki_field(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\n', "<br>").replace('\t', " ")
}

/// Render flashcards as Anki import text: `question\tanswer\timage` per line.
pub fn to_anki(flashcards: &[Flashcard]) -> String {
    let mut out = String::new();
    for card in flashcards {
        let image = match card.image.as_deref() {
            Some(src) if is_valid_image_ref(src) => format!("<img src=\"{src}\">"),
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "{}\t{}\t{}",
            anki_field(&card.question),
            anki_field(&card.answer),
            image
        );
    }
    out
}

// ── Markdown ─────────────────────────────────────────────────────────────

type SectionRenderer = fn(&RevisionSheet, &mut String);

/// Sections in document order. Each renderer writes nothing when its
/// section is empty.
const SECTIONS: [SectionRenderer; 11] = [
    |r, out| paragraph(out, "Introduction 📋", &r.introduction),
    |r, out| paragraph(out, "Summary 📝", &r.summary),
    definitions,
    |r, out| paragraph(out, "Methodology 🔍", &r.methodology),
    |r, out| bullets(out, "Examples 💡", &r.examples),
    |r, out| paragraph(out, "Practical applications 🛠️", &r.practical_applications),
    |r, out| bullets(out, "Key points 🔑", &r.key_points),
    |r, out| bullets(out, "Must know 🌟", &r.must_know),
    |r, out| paragraph(out, "Conclusion 🏁", &r.conclusion),
    |r, out| bullets(out, "Revision tips 🧠", &r.tips),
    illustrations,
];

/// Render a revision sheet as Markdown. The result ends with exactly one
/// newline.
pub fn to_markdown(revision: &RevisionSheet) -> String {
    let title = revision.title.trim();
    let mut out = format!(
        "# {}\n\n",
        if title.is_empty() { "Revision sheet" } else { title }
    );
    for render in SECTIONS {
        render(revision, &mut out);
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

fn paragraph(out: &mut String, heading: &str, body: &str) {
    let body = body.trim();
    if !body.is_empty() {
        let _ = write!(out, "## {heading}\n\n{body}\n\n");
    }
}

fn bullets(out: &mut String, heading: &str, items: &[String]) {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return;
    }
    let _ = write!(out, "## {heading}\n\n");
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
    out.push('\n');
}

fn definitions(r: &RevisionSheet, out: &mut String) {
    let defs: Vec<&Definition> = r
        .definitions
        .iter()
        .filter(|d| !d.term.trim().is_empty() || !d.definition.trim().is_empty())
        .collect();
    if defs.is_empty() {
        return;
    }
    out.push_str("## Key definitions 📚\n\n");
    for d in defs {
        if d.definition.trim().is_empty() {
            let _ = write!(out, "{}\n\n", d.term.trim());
        } else {
            let _ = write!(out, "**{}**: {}\n\n", d.term.trim(), d.definition.trim());
        }
    }
}

fn illustrations(r: &RevisionSheet, out: &mut String) {
    let images: Vec<&String> = r.images.iter().filter(|s| is_valid_image_ref(s)).collect();
    if images.is_empty() {
        return;
    }
    out.push_str("## Illustrations 🖼️\n\n");
    for (i, src) in images.iter().enumerate() {
        let _ = write!(out, "![Image {}]({})\n\n", i + 1, src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(q: &str, a: &str, image: Option<&str>) -> Flashcard {
        Flashcard {
            question: q.into(),
            answer: a.into(),
            image: image.map(String::from),
        }
    }

    #[test]
    fn anki_lines_escape_newlines_and_tabs() {
        let out = to_anki(&[card("What\tis\nit?", "A\r\nB", None)]);
        assert_eq!(out, "What is<br>it?\tA<br>B\t\n");
    }

    #[test]
    fn anki_image_column() {
        let out = to_anki(&[
            card("Q1", "A1", Some("/uploads/pdf_images/ab12cd34/img-1.jpg")),
            card("Q2", "A2", Some("url_de_l_image")),
        ]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "Q1\tA1\t<img src=\"/uploads/pdf_images/ab12cd34/img-1.jpg\">"
        );
        assert_eq!(lines[1], "Q2\tA2\t");
    }

    #[test]
    fn anki_of_nothing_is_empty() {
        assert_eq!(to_anki(&[]), "");
    }

    #[test]
    fn image_ref_rules() {
        assert!(is_valid_image_ref("https://example.com/a"));
        assert!(is_valid_image_ref("/uploads/x"));
        assert!(is_valid_image_ref("/public/uploads/y"));
        assert!(is_valid_image_ref("/static/pic.png"));
        assert!(!is_valid_image_ref("/static/page.html"));
        assert!(!is_valid_image_ref("url_de_l_image"));
        assert!(!is_valid_image_ref("#"));
        assert!(!is_valid_image_ref(""));
        assert!(!is_valid_image_ref("img-1.jpg"));
    }

    #[test]
    fn markdown_renders_sections_in_order_and_skips_empty() {
        let sheet = RevisionSheet {
            title: "📘 Cells".into(),
            introduction: "Cells are units.".into(),
            summary: "Short.".into(),
            definitions: vec![
                Definition {
                    term: "Mitosis".into(),
                    definition: "Division.".into(),
                },
                Definition {
                    term: "Loose note".into(),
                    definition: String::new(),
                },
            ],
            key_points: vec!["One".into(), " ".into()],
            tips: vec!["Sleep".into()],
            images: vec!["/uploads/pdf_images/x/img-1.jpg".into(), "#".into()],
            ..Default::default()
        };
        let md = to_markdown(&sheet);

        assert!(md.starts_with("# 📘 Cells\n\n## Introduction 📋\n\nCells are units.\n\n"));
        assert!(md.contains("**Mitosis**: Division.\n\n"));
        assert!(md.contains("\nLoose note\n\n"));
        assert!(md.contains("## Key points 🔑\n\n- One\n\n"));
        assert!(!md.contains("Methodology"));
        assert!(!md.contains("Conclusion"));
        assert!(md.contains("![Image 1](/uploads/pdf_images/x/img-1.jpg)"));
        assert!(!md.contains("Image 2"));
        assert!(md.ends_with(".jpg)\n"));

        let intro = md.find("Introduction").unwrap();
        let defs = md.find("Key definitions").unwrap();
        let tips = md.find("Revision tips").unwrap();
        assert!(intro < defs && defs < tips);
    }

    #[test]
    fn markdown_of_empty_sheet() {
        assert_eq!(to_markdown(&RevisionSheet::default()), "# Revision sheet\n");
    }

    #[test]
    fn formats() {
        assert_eq!(ExportFormat::Anki.file_name(), "flashcards_anki.txt");
        assert!(ExportFormat::Markdown.mime_type().starts_with("text/markdown"));
    }
}
