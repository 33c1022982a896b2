//! The `explain` use case: what an issue code reports and how to fix it.

use mapdebug_types::explain::{self, Explanation};
use mapdebug_types::ids;

/// Everything known about one issue code.
#[derive(Clone, Debug)]
pub struct IssueDoc {
    pub code: &'static str,
    /// The `message` carried by every record of this code.
    pub message: &'static str,
    /// Keys of the record's `data` object. Empty when `data` is null.
    pub evidence: &'static [&'static str],
    pub explanation: Explanation,
}

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Found(IssueDoc),
    /// Unknown code; includes the available codes.
    NotFound {
        identifier: String,
        available_codes: &'static [&'static str],
    },
}

/// Evidence keys a record of `code` may carry, in wire order.
///
/// `dist_mismatch` only carries `artifactDist` when the event's distribution exists.
pub fn evidence_keys(code: &str) -> &'static [&'static str] {
    match code {
        ids::CODE_MISSING_USER_AGENT => &["version", "filename"],
        ids::CODE_URL_NOT_VALID => &["absPath"],
        ids::CODE_PARTIAL_MATCH => &[
            "absPath",
            "partialMatchPath",
            "filename",
            "unifiedPath",
            "urlPrefix",
            "artifactNames",
        ],
        ids::CODE_NO_URL_MATCH => &["absPath", "filename", "unifiedPath", "artifactNames"],
        ids::CODE_DIST_MISMATCH => &["eventDist", "artifactDist", "filename"],
        ids::CODE_SOURCEMAP_NOT_FOUND => &["filename"],
        _ => &[],
    }
}

/// Look up the documentation of an issue code. Codes match exactly.
pub fn run_explain(identifier: &str) -> ExplainOutput {
    let doc = explain::lookup_explanation(identifier).and_then(|explanation| {
        let code = ids::ALL_CODES.iter().copied().find(|c| *c == identifier)?;
        Some(IssueDoc {
            code,
            message: ids::message_for(code)?,
            evidence: evidence_keys(code),
            explanation,
        })
    });
    match doc {
        Some(doc) => ExplainOutput::Found(doc),
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            available_codes: explain::all_codes(),
        },
    }
}

/// Format an issue code's documentation for terminal display.
pub fn format_explanation(doc: &IssueDoc) -> String {
    let exp = &doc.explanation;
    let evidence = if doc.evidence.is_empty() {
        "Evidence: none (`data` is null)".to_string()
    } else {
        format!("Evidence:\n{}", indent(&doc.evidence.join("\n"), 2))
    };
    let sections = [
        format!("{}: {}", doc.code, doc.message),
        format!("{}\n\n{}", exp.title, exp.description),
        evidence,
        format!("Remediation:\n{}", indent(exp.remediation, 2)),
        format!(
            "Issue:\n{}\nResolves:\n{}",
            indent(exp.examples.before, 4),
            indent(exp.examples.after, 4)
        ),
    ];
    let mut out = sections.join("\n\n");
    out.push('\n');
    out
}

/// Format the "not found" error message for terminal display.
pub fn format_not_found(identifier: &str, codes: &[&'static str]) -> String {
    format!(
        "Unknown issue code: {identifier}\n\nKnown codes:\n{}\n",
        indent(&codes.join("\n"), 2)
    )
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
