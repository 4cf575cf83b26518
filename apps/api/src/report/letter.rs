//! Cover letter post-processing.
//!
//! Model-written letters arrive in wildly uneven shape: placeholder lines,
//! duplicated contact headers, missing greetings, one giant run-on paragraph.
//! This pass normalizes all of that into a stable paragraph list before the
//! letter is stored in the report.

use crate::repair::split_sentences;

const BANNED_LINES: &[&str] = &[
    "hiring manager",
    "hiring team",
    "company address",
    "[header]",
    "[opening]",
    "[greetings]",
    "[middle]",
    "[closing]",
    "[signature]",
];

const ADDRESS_MARKERS: &[&str] = &[
    "street",
    "st.",
    "ave",
    "avenue",
    "road",
    "rd.",
    "boulevard",
    "blvd",
];

/// Soft cap when re-paragraphing a letter that arrived as one block.
const MAX_PARAGRAPH_LEN: usize = 160;

/// Normalizes a raw letter into a list of paragraphs: the greeting first
/// (forced to "Dear Hiring Manager," when absent), then the body paragraphs,
/// then a "Sincerely,\n<signature>" block when `signature` is given and the
/// letter does not already sign off.
pub fn normalize_paragraphs(raw: &str, signature: Option<&str>) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let text = raw.replace("\r\n", "\n").replace('\r', "\n");

    // Drop placeholder lines the model sometimes emits verbatim.
    let mut lines: Vec<String> = text
        .trim()
        .lines()
        .filter(|line| {
            let lowered = line.trim().to_lowercase();
            !BANNED_LINES.contains(&lowered.as_str())
        })
        .map(str::to_string)
        .collect();

    // Strip accidental contact-header lines at the very top.
    while let Some(first) = lines.first() {
        let first = first.trim();
        if !first.is_empty() && looks_like_contact_line(first) {
            lines.remove(0);
        } else {
            break;
        }
    }

    // Pull the greeting out wherever it appears.
    let greeting = match lines
        .iter()
        .position(|l| l.trim().to_lowercase().starts_with("dear "))
    {
        Some(idx) => {
            let line = lines.remove(idx);
            line.trim().to_string()
        }
        None => "Dear Hiring Manager,".to_string(),
    };

    let body = lines.join("\n").trim().to_string();

    let has_existing_signature = body.lines().any(|l| {
        let trimmed = l.trim().trim_end_matches(',').trim();
        trimmed.eq_ignore_ascii_case("sincerely") || trimmed.eq_ignore_ascii_case("regards")
    });

    let mut paragraphs: Vec<String> = body
        .split("\n\n")
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    // One giant block: rebuild paragraphs from sentences with a soft cap.
    if paragraphs.len() <= 1 {
        let grouped = group_sentences(&body);
        if !grouped.is_empty() {
            paragraphs = grouped;
        }
    }

    let mut result = vec![greeting];
    result.extend(paragraphs);

    if let Some(signature) = signature.map(str::trim).filter(|s| !s.is_empty()) {
        if !has_existing_signature {
            result.push(format!("Sincerely,\n{signature}"));
        }
    }

    result
}

/// Normalizes and re-joins into the stored single-string form, paragraphs
/// separated by blank lines.
pub fn normalize_cover_letter(raw: &str, signature: Option<&str>) -> String {
    normalize_paragraphs(raw, signature).join("\n\n")
}

fn looks_like_contact_line(line: &str) -> bool {
    if line.contains('@') {
        return true;
    }
    // Two runs of 2+ digits reads as a phone number.
    let digit_runs = line
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| run.len() >= 2)
        .count();
    if digit_runs >= 2 {
        return true;
    }
    let lowered = line.to_lowercase();
    ADDRESS_MARKERS.iter().any(|m| lowered.contains(m))
}

fn group_sentences(text: &str) -> Vec<String> {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut grouped: Vec<String> = Vec::new();
    let mut current = String::new();
    for sentence in split_sentences(&flat) {
        if current.is_empty() {
            current = sentence;
        } else if current.len() + 1 + sentence.len() <= MAX_PARAGRAPH_LEN {
            current.push(' ');
            current.push_str(&sentence);
        } else {
            grouped.push(std::mem::take(&mut current));
            current = sentence;
        }
    }
    if !current.is_empty() {
        grouped.push(current);
    }
    grouped
}
