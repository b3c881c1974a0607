//! Token budget estimation and structural truncation for pack output
//! (spec §4.1 C1), grounded on the grounding crate's whole-output
//! `token_budget::estimate_tokens`/`truncate_to_budget`, generalized here
//! from flat line lists to markdown-section-aware truncation.

use pui_core::error::PuiError;

const CHARS_PER_TOKEN: usize = 4;

/// Estimate token count: 1 token per 4 bytes, floored to 1 per non-empty
/// whitespace-delimited run (spec §4.1 — "treat it as an ordering/guard,
/// not an exact count").
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace()
        .map(|run| ((run.len() + CHARS_PER_TOKEN - 1) / CHARS_PER_TOKEN).max(1))
        .sum()
}

#[derive(Debug, Clone)]
pub struct Truncated {
    pub text: String,
    pub truncated: bool,
    pub dropped_count: usize,
}

struct Section {
    header: Option<String>,
    lines: Vec<String>,
}

impl Section {
    fn rendered_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(h) = &self.header {
            out.push(h.clone());
        }
        out.extend(self.lines.iter().cloned());
        out
    }

    /// Table rows are the truncation unit when present, else raw lines.
    fn unit_count(&self) -> usize {
        let table_rows = self.lines.iter().filter(|l| l.trim_start().starts_with('|')).count();
        if table_rows > 0 { table_rows } else { self.lines.len() }
    }
}

fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = vec![Section { header: None, lines: Vec::new() }];
    for line in text.lines() {
        if line.starts_with("## ") || line.starts_with("### ") {
            sections.push(Section { header: Some(line.to_string()), lines: Vec::new() });
        } else {
            sections.last_mut().unwrap().lines.push(line.to_string());
        }
    }
    sections
}

fn render(sections: &[Section]) -> String {
    sections.iter().flat_map(|s| s.rendered_lines()).collect::<Vec<_>>().join("\n")
}

fn marker_line(n: usize) -> String {
    format!("_(+{n} more available — use `zoom` for detail)_")
}

/// Drop the lowest-priority unit (last table row, else last line) from a
/// section. Never leaves a code fence unclosed: dropping the close of a
/// fence instead drops the whole fenced block.
fn drop_last_unit(section: &mut Section) -> bool {
    if section.lines.is_empty() {
        return false;
    }
    let last = section.lines.last().unwrap();
    if last.trim_start().starts_with("```") {
        let mut i = section.lines.len();
        let mut fences_seen = 0;
        while i > 0 {
            i -= 1;
            if section.lines[i].trim_start().starts_with("```") {
                fences_seen += 1;
                if fences_seen == 2 {
                    break;
                }
            }
        }
        section.lines.truncate(i);
    } else {
        section.lines.pop();
    }
    true
}

/// Truncate `text` (a rendered pack, `##`/`###` headers delimiting
/// sections) to fit `budget` tokens. The first section (header/metadata,
/// before any recognized header) is mandatory and never dropped. A
/// trailing `## Metadata` section, where present, is equally mandatory —
/// every pack renders it last for readability, but callers still need a
/// guaranteed schema_version/index_version even under a tight budget, so
/// it is pinned to survive regardless of its position. Remaining sections
/// are dropped whole from the end first, then truncated unit by unit.
/// Appends exactly one "N more available" marker when truncation occurs.
pub fn truncate(text: &str, budget: usize) -> Result<Truncated, PuiError> {
    let total = estimate_tokens(text);
    if total <= budget {
        return Ok(Truncated { text: text.to_string(), truncated: false, dropped_count: 0 });
    }

    let mut sections = split_sections(text);
    let metadata = sections
        .iter()
        .position(|s| s.header.as_deref() == Some("## Metadata"))
        .map(|idx| sections.remove(idx));

    let current_tokens = |sections: &[Section], metadata: &Option<Section>| -> usize {
        let mut rendered = render(sections);
        if let Some(m) = metadata {
            rendered.push('\n');
            rendered.push_str(&render(std::slice::from_ref(m)));
        }
        estimate_tokens(&rendered)
    };

    let mandatory_tokens = estimate_tokens(&render(&sections[..1]))
        + metadata.as_ref().map(|m| estimate_tokens(&render(std::slice::from_ref(m)))).unwrap_or(0);
    if mandatory_tokens > budget {
        return Err(PuiError::BudgetTooSmall { needed: mandatory_tokens, budget });
    }

    let marker_tokens = estimate_tokens(&marker_line(0));
    let mut dropped_count = 0usize;

    while sections.len() > 1 {
        if current_tokens(&sections, &metadata) + marker_tokens <= budget {
            break;
        }
        let removed = sections.pop().unwrap();
        dropped_count += removed.unit_count().max(1);
    }

    while sections.len() > 1 && current_tokens(&sections, &metadata) + marker_tokens > budget {
        let last = sections.last_mut().unwrap();
        if drop_last_unit(last) {
            dropped_count += 1;
        } else {
            sections.pop();
            break;
        }
    }

    let mut out = render(&sections);
    if let Some(m) = &metadata {
        out.push('\n');
        out.push_str(&render(std::slice::from_ref(m)));
    }
    out.push('\n');
    out.push_str(&marker_line(dropped_count));

    Ok(Truncated { text: out, truncated: true, dropped_count })
}

/// The minimal pack spec §7 mandates when even the mandatory content
/// (header + `## Metadata`) can't fit the requested budget: mandatory
/// metadata plus a note explaining why everything else is missing, instead
/// of the empty output a bare `Err` would leave a caller with.
pub fn minimal_markdown_pack(schema_version: u32, index_version: &str, needed: usize, budget: usize) -> Truncated {
    let text = format!(
        "## Metadata\nschema_version={schema_version}\nindex_version={index_version}\n\n_(budget too small: needed ~{needed} tokens, got {budget} -- showing metadata only)_"
    );
    Truncated { text, truncated: true, dropped_count: 0 }
}

/// JSON counterpart of [`minimal_markdown_pack`], for `Structured` output.
pub fn minimal_json_pack(schema_version: u32, index_version: &str, needed: usize, budget: usize) -> Truncated {
    let value = serde_json::json!({
        "schema_version": schema_version,
        "metadata": { "index_version": index_version },
        "error": format!("budget too small: needed ~{needed} tokens, got {budget}"),
    });
    let text = serde_json::to_string_pretty(&value).unwrap_or_default();
    Truncated { text, truncated: true, dropped_count: 0 }
}
