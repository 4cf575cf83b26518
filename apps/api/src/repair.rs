//! Response repair — turns whatever JSON the tailoring model produced into a
//! well-typed `StructuredResume`.
//!
//! The function is pure and total: any input value, including `null`, arrays,
//! or deeply nested garbage, yields a valid document. Fields that cannot be
//! read coerce to empty strings or empty lists; they never fail the whole
//! document. Schema validation remains a separate final gate in the engine.

use serde_json::Value;

use crate::schema::{
    is_valid_link, Basics, CustomSection, Education, Experience, ResumeLink, StructuredResume,
};

/// Repairs an arbitrary decoded JSON value into a canonical resume document.
///
/// Steps, in order: scalar/list coercion, link filtering, bullet
/// normalization, custom-section pruning, thesis relocation.
pub fn repair_structured_resume(raw: &Value) -> StructuredResume {
    let basics_raw = raw.get("basics").unwrap_or(&Value::Null);

    let photo = string_field(basics_raw, "photo");
    let basics = Basics {
        name: string_field(basics_raw, "name"),
        email: string_field(basics_raw, "email"),
        phone: string_field(basics_raw, "phone"),
        location: string_field(basics_raw, "location"),
        summary: string_field(basics_raw, "summary"),
        photo: if photo.trim().is_empty() { None } else { Some(photo) },
        links: repair_links(items(basics_raw, "links")),
    };

    let mut education: Vec<Education> = items(raw, "education")
        .iter()
        .map(|item| Education {
            school: string_field(item, "school"),
            degree: string_field(item, "degree"),
            year: string_field(item, "year"),
        })
        .collect();

    let experience: Vec<Experience> = items(raw, "experience")
        .iter()
        .map(|item| Experience {
            company: string_field(item, "company"),
            role: string_field(item, "role"),
            years: string_field(item, "years"),
            description: normalize_bullets(&string_field(item, "description")),
        })
        .collect();

    let mut custom_sections: Vec<CustomSection> = items(raw, "customSections")
        .iter()
        .map(|item| CustomSection {
            title: string_field(item, "title"),
            content: string_field(item, "content"),
        })
        .filter(|s| !s.title.trim().is_empty() || !s.content.trim().is_empty())
        .collect();

    relocate_thesis(&mut education, &mut custom_sections);

    StructuredResume {
        basics,
        education,
        experience,
        skills: string_list(raw, "skills"),
        certifications: string_list(raw, "certifications"),
        languages: string_list(raw, "languages"),
        custom_sections,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Coercion helpers — pure and total, never panic
// ────────────────────────────────────────────────────────────────────────────

/// Coerces a single JSON value to a string. Objects, arrays, and null all
/// become the empty string.
fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Reads `obj[key]` as a string, or empty string.
fn string_field(obj: &Value, key: &str) -> String {
    obj.get(key).map(coerce_string).unwrap_or_default()
}

/// Reads `obj[key]` as an array, or the empty slice.
fn items<'a>(obj: &'a Value, key: &str) -> &'a [Value] {
    match obj.get(key) {
        Some(Value::Array(a)) => a,
        _ => &[],
    }
}

/// Reads `obj[key]` as a list of strings, dropping entries that are empty
/// after trimming. Order and duplicates are preserved.
fn string_list(obj: &Value, key: &str) -> Vec<String> {
    items(obj, key)
        .iter()
        .map(coerce_string)
        .filter(|s| !s.trim().is_empty())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Links
// ────────────────────────────────────────────────────────────────────────────

/// Keeps only links with an http(s)/mailto URL; missing labels default to
/// "Link N", numbered over the surviving entries.
fn repair_links(raw_links: &[Value]) -> Vec<ResumeLink> {
    let mut links = Vec::new();
    for item in raw_links {
        let url = string_field(item, "url").trim().to_string();
        if !is_valid_link(&url) {
            continue;
        }
        let label = string_field(item, "label");
        let label = if label.trim().is_empty() {
            format!("Link {}", links.len() + 1)
        } else {
            label
        };
        links.push(ResumeLink { label, url });
    }
    links
}

// ────────────────────────────────────────────────────────────────────────────
// Bullet normalization
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes an experience description into `"- "`-prefixed bullet lines.
///
/// When the model collapses all bullets into a single prose line, that line
/// is re-split on sentence boundaries so each sentence becomes one bullet.
fn normalize_bullets(description: &str) -> String {
    let lines: Vec<&str> = description
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let bullets: Vec<String> = if lines.len() == 1 && !lines[0].starts_with("- ") {
        split_sentences(lines[0])
            .into_iter()
            .map(|s| format!("- {s}"))
            .collect()
    } else {
        lines
            .iter()
            .map(|l| {
                if l.starts_with("- ") {
                    (*l).to_string()
                } else {
                    format!("- {l}")
                }
            })
            .collect()
    };

    bullets.join("\n")
}

/// Splits text on sentence boundaries: `.`, `?`, or `!` followed by
/// whitespace. The terminating punctuation stays with its sentence.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (idx, c) = chars[i];
        if matches!(c, '.' | '?' | '!') {
            if let Some(&(_, next)) = chars.get(i + 1) {
                if next.is_whitespace() {
                    let sentence = text[start..idx + c.len_utf8()].trim();
                    if !sentence.is_empty() {
                        sentences.push(sentence.to_string());
                    }
                    let mut j = i + 1;
                    while j < chars.len() && chars[j].1.is_whitespace() {
                        j += 1;
                    }
                    start = chars.get(j).map(|&(k, _)| k).unwrap_or(text.len());
                    i = j;
                    continue;
                }
            }
        }
        i += 1;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

// ────────────────────────────────────────────────────────────────────────────
// Thesis relocation
// ────────────────────────────────────────────────────────────────────────────

/// Folds a "thesis"-titled custom section into the matching education entry.
///
/// Prefers the entry whose degree contains "m." (a master's-level heuristic;
/// known to also match degrees like "M.B.A"), else the first entry. Leaves
/// the section alone when there is no education to attach it to.
fn relocate_thesis(education: &mut [Education], custom_sections: &mut Vec<CustomSection>) {
    if education.is_empty() {
        return;
    }
    let Some(pos) = custom_sections
        .iter()
        .position(|s| s.title.to_lowercase().contains("thesis"))
    else {
        return;
    };
    let section = custom_sections.remove(pos);

    let target = education
        .iter()
        .position(|e| e.degree.to_lowercase().contains("m."))
        .unwrap_or(0);

    let entry = &mut education[target];
    entry.degree.push_str(&format!(" — Thesis: {}", section.title.trim()));
    let content = section.content.trim();
    if !content.is_empty() {
        entry.degree.push_str(&format!(" — {content}"));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Contract;
    use serde_json::json;

    #[test]
    fn test_repair_is_total_over_garbage_inputs() {
        for value in [
            json!(null),
            json!([1, 2, 3]),
            json!("just a string"),
            json!(42),
            json!({"basics": "not an object", "experience": {"nested": true}}),
            json!({"basics": {"links": "nope"}, "skills": {"a": 1}}),
        ] {
            let resume = repair_structured_resume(&value);
            assert!(resume.validate().is_ok(), "failed on {value}");
            assert!(resume.experience.is_empty());
        }
    }

    #[test]
    fn test_scalar_coercion_accepts_numbers() {
        let raw = json!({"education": [{"school": "MIT", "degree": "B.Sc.", "year": 2020}]});
        let resume = repair_structured_resume(&raw);
        assert_eq!(resume.education[0].year, "2020");
    }

    #[test]
    fn test_invalid_link_is_dropped() {
        let raw = json!({"basics": {"links": [{"label": "x", "url": "not-a-url"}]}});
        let resume = repair_structured_resume(&raw);
        assert!(resume.basics.links.is_empty());
    }

    #[test]
    fn test_valid_links_survive_and_missing_labels_default() {
        let raw = json!({"basics": {"links": [
            {"label": "GitHub", "url": "https://github.com/jane"},
            {"url": "  mailto:jane@example.com  "},
            {"label": "bad", "url": "example.com"},
            {"url": "http://janes.dev"}
        ]}});
        let resume = repair_structured_resume(&raw);
        assert_eq!(resume.basics.links.len(), 3);
        assert_eq!(resume.basics.links[0].label, "GitHub");
        assert_eq!(resume.basics.links[1].label, "Link 2");
        assert_eq!(resume.basics.links[1].url, "mailto:jane@example.com");
        assert_eq!(resume.basics.links[2].label, "Link 3");
    }

    #[test]
    fn test_bullet_lines_get_prefixed() {
        let raw = json!({"experience": [{
            "company": "Acme",
            "role": "Engineer",
            "years": "2020 - 2023",
            "description": "- Built X\nImproved Y\n\n  - Shipped Z  "
        }]});
        let resume = repair_structured_resume(&raw);
        assert_eq!(
            resume.experience[0].description,
            "- Built X\n- Improved Y\n- Shipped Z"
        );
    }

    #[test]
    fn test_single_prose_line_resplits_on_sentences() {
        let raw = json!({"experience": [{
            "company": "Acme",
            "role": "Lead",
            "years": "2021",
            "description": "Led a team of 5 and shipped 3 releases."
        }]});
        let resume = repair_structured_resume(&raw);
        assert_eq!(
            resume.experience[0].description,
            "- Led a team of 5 and shipped 3 releases."
        );
    }

    #[test]
    fn test_collapsed_prose_becomes_one_bullet_per_sentence() {
        let raw = json!({"experience": [{
            "description": "Built the billing system. Cut costs by 30%! Mentored juniors."
        }]});
        let resume = repair_structured_resume(&raw);
        assert_eq!(
            resume.experience[0].description,
            "- Built the billing system.\n- Cut costs by 30%!\n- Mentored juniors."
        );
    }

    #[test]
    fn test_single_already_bulleted_line_is_untouched() {
        let raw = json!({"experience": [{"description": "- Did one thing. Then another."}]});
        let resume = repair_structured_resume(&raw);
        assert_eq!(resume.experience[0].description, "- Did one thing. Then another.");
    }

    #[test]
    fn test_bullet_invariant_holds_after_repair() {
        let raw = json!({"experience": [
            {"description": "plain line\nanother line"},
            {"description": "One sentence here. And a second one."},
            {"description": ""}
        ]});
        let resume = repair_structured_resume(&raw);
        for exp in &resume.experience {
            for line in exp.bullet_lines() {
                assert!(line.starts_with("- "), "line not bulleted: {line}");
            }
        }
    }

    #[test]
    fn test_empty_custom_sections_are_dropped() {
        let raw = json!({"customSections": [
            {"title": "", "content": "  "},
            {"title": "Projects", "content": ""},
            {"title": "", "content": "Some content"}
        ]});
        let resume = repair_structured_resume(&raw);
        assert_eq!(resume.custom_sections.len(), 2);
        assert_eq!(resume.custom_sections[0].title, "Projects");
    }

    #[test]
    fn test_thesis_moves_to_masters_degree_entry() {
        let raw = json!({
            "education": [
                {"school": "State U", "degree": "B.Sc. Physics", "year": "2018"},
                {"school": "Tech U", "degree": "M.Sc. Computer Science", "year": "2020"}
            ],
            "customSections": [
                {"title": "Master Thesis", "content": "Distributed consensus at scale"}
            ]
        });
        let resume = repair_structured_resume(&raw);
        assert!(resume.custom_sections.is_empty());
        assert_eq!(resume.education[0].degree, "B.Sc. Physics");
        assert_eq!(
            resume.education[1].degree,
            "M.Sc. Computer Science — Thesis: Master Thesis — Distributed consensus at scale"
        );
    }

    #[test]
    fn test_thesis_falls_back_to_first_education_entry() {
        let raw = json!({
            "education": [{"school": "State U", "degree": "Diploma", "year": "2018"}],
            "customSections": [{"title": "Thesis", "content": ""}]
        });
        let resume = repair_structured_resume(&raw);
        assert!(resume.custom_sections.is_empty());
        assert_eq!(resume.education[0].degree, "Diploma — Thesis: Thesis");
    }

    #[test]
    fn test_thesis_section_kept_when_no_education_exists() {
        let raw = json!({"customSections": [{"title": "Thesis", "content": "kept"}]});
        let resume = repair_structured_resume(&raw);
        assert_eq!(resume.custom_sections.len(), 1);
    }

    #[test]
    fn test_repair_is_idempotent_on_repaired_document() {
        let raw = json!({
            "basics": {"name": "Jane", "links": [{"label": "GitHub", "url": "https://github.com/jane"}]},
            "education": [{"school": "Tech U", "degree": "M.Sc. CS", "year": "2020"}],
            "experience": [{"company": "Acme", "role": "Engineer", "years": "2020", "description": "Did A. Did B."}],
            "customSections": [{"title": "Thesis", "content": "Consensus"}]
        });
        let once = repair_structured_resume(&raw);
        let twice = repair_structured_resume(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_skills_drop_blank_entries_but_keep_duplicates() {
        let raw = json!({"skills": ["Rust", "  ", "", "Rust", "Go"]});
        let resume = repair_structured_resume(&raw);
        assert_eq!(resume.skills, vec!["Rust", "Rust", "Go"]);
    }

    #[test]
    fn test_photo_is_none_when_blank() {
        let raw = json!({"basics": {"photo": "   "}});
        assert!(repair_structured_resume(&raw).basics.photo.is_none());
        let raw = json!({"basics": {"photo": "data:image/png;base64,AAAA"}});
        assert_eq!(
            repair_structured_resume(&raw).basics.photo.as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn test_split_sentences_handles_abbrev_free_prose() {
        assert_eq!(
            split_sentences("One. Two? Three!"),
            vec!["One.", "Two?", "Three!"]
        );
        assert_eq!(split_sentences("No terminator"), vec!["No terminator"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_split_sentences_ignores_mid_token_punctuation() {
        // "3.5" must not split: the period is not followed by whitespace.
        assert_eq!(
            split_sentences("Raised uptime to 99.95 percent. Cut latency."),
            vec!["Raised uptime to 99.95 percent.", "Cut latency."]
        );
    }
}
