//! Contract clause identification against a fixed vocabulary.
//!
//! The vocabulary is a closed set of eight clause types, each carrying a
//! short bilingual (English/Hindi) description used both in the
//! extraction prompt and as the explanation attached to results. The
//! generation capability is asked once for a strict JSON payload; the
//! response is validated at the boundary with a hard reject-unknown
//! policy — model output never becomes a stored clause type unless it
//! parses into [`ClauseType`].
//!
//! Clause mining is deliberately non-fatal: a malformed response degrades
//! to an empty list so an upload never fails because of it.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ServiceError;
use crate::llm::TextGenerator;
use crate::models::NormalizedPage;

/// Cap on the document text sent for clause mining.
const CLAUSE_INPUT_CAP: usize = 24_000;
/// Marker appended when the document was cut at the cap.
const TRUNCATION_MARKER: &str = "\n[दस्तावेज़ यहाँ काटा गया / document truncated here]";
/// Characters of `extracted_text` used to locate the originating page.
const PAGE_MATCH_PREFIX: usize = 60;

/// A short English/Hindi text pair.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Bilingual {
    pub en: &'static str,
    pub hi: &'static str,
}

/// The fixed clause vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClauseType {
    #[serde(rename = "Termination")]
    Termination,
    #[serde(rename = "Confidentiality")]
    Confidentiality,
    #[serde(rename = "Indemnification")]
    Indemnification,
    #[serde(rename = "Governing Law")]
    GoverningLaw,
    #[serde(rename = "Payment Terms")]
    PaymentTerms,
    #[serde(rename = "Dispute Resolution")]
    DisputeResolution,
    #[serde(rename = "Limitation of Liability")]
    LimitationOfLiability,
    #[serde(rename = "Force Majeure")]
    ForceMajeure,
}

pub const ALL_CLAUSE_TYPES: [ClauseType; 8] = [
    ClauseType::Termination,
    ClauseType::Confidentiality,
    ClauseType::Indemnification,
    ClauseType::GoverningLaw,
    ClauseType::PaymentTerms,
    ClauseType::DisputeResolution,
    ClauseType::LimitationOfLiability,
    ClauseType::ForceMajeure,
];

impl ClauseType {
    pub fn label(&self) -> &'static str {
        match self {
            ClauseType::Termination => "Termination",
            ClauseType::Confidentiality => "Confidentiality",
            ClauseType::Indemnification => "Indemnification",
            ClauseType::GoverningLaw => "Governing Law",
            ClauseType::PaymentTerms => "Payment Terms",
            ClauseType::DisputeResolution => "Dispute Resolution",
            ClauseType::LimitationOfLiability => "Limitation of Liability",
            ClauseType::ForceMajeure => "Force Majeure",
        }
    }

    /// The bilingual description shown in the extraction prompt and
    /// attached to every identified clause of this type.
    pub fn explanation(&self) -> Bilingual {
        match self {
            ClauseType::Termination => Bilingual {
                en: "Conditions under which either party may end the agreement",
                hi: "वे शर्तें जिनके तहत कोई भी पक्ष अनुबंध समाप्त कर सकता है",
            },
            ClauseType::Confidentiality => Bilingual {
                en: "Obligations to keep shared information secret",
                hi: "साझा की गई जानकारी को गोपनीय रखने की बाध्यताएँ",
            },
            ClauseType::Indemnification => Bilingual {
                en: "Promise to compensate the other party for certain losses",
                hi: "कुछ हानियों के लिए दूसरे पक्ष को क्षतिपूर्ति देने का वचन",
            },
            ClauseType::GoverningLaw => Bilingual {
                en: "Which jurisdiction's law governs the agreement",
                hi: "अनुबंध किस क्षेत्राधिकार के कानून के अधीन है",
            },
            ClauseType::PaymentTerms => Bilingual {
                en: "Amounts, schedule, and method of payment",
                hi: "भुगतान की राशि, समय-सारिणी और तरीका",
            },
            ClauseType::DisputeResolution => Bilingual {
                en: "How disagreements are settled: arbitration, courts, mediation",
                hi: "विवादों का निपटारा कैसे होगा: मध्यस्थता, न्यायालय या सुलह",
            },
            ClauseType::LimitationOfLiability => Bilingual {
                en: "Caps or exclusions on what a party can be held liable for",
                hi: "किसी पक्ष के दायित्व की सीमा या उससे छूट",
            },
            ClauseType::ForceMajeure => Bilingual {
                en: "Relief from obligations during events beyond either party's control",
                hi: "पक्षों के नियंत्रण से बाहर की घटनाओं के दौरान दायित्वों से राहत",
            },
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        ALL_CLAUSE_TYPES
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(label.trim()))
    }
}

/// One identified clause, ready to return to the uploader.
#[derive(Debug, Clone, Serialize)]
pub struct ClauseRecord {
    pub clause_type: ClauseType,
    pub extracted_text: String,
    pub page_number: u32,
    pub explanation: Bilingual,
}

/// Ask the generation capability to find vocabulary clauses in the
/// document. Errors are the caller's to degrade: uploads must not fail
/// solely because clause mining failed.
pub async fn identify_clauses(
    generator: &dyn TextGenerator,
    pages: &[NormalizedPage],
) -> Result<Vec<ClauseRecord>, ServiceError> {
    let document = assemble_document(pages);
    let prompt = build_prompt(&document);
    let response = generator
        .generate(&prompt)
        .await
        .map_err(|e| ServiceError::ClauseIdentification(e.to_string()))?;
    let entries = parse_response(&response)?;
    Ok(entries
        .into_iter()
        .map(|(clause_type, extracted_text)| {
            let page_number = locate_page(&extracted_text, pages);
            ClauseRecord {
                clause_type,
                explanation: clause_type.explanation(),
                extracted_text,
                page_number,
            }
        })
        .collect())
}

fn assemble_document(pages: &[NormalizedPage]) -> String {
    let joined = pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let char_count = joined.chars().count();
    if char_count <= CLAUSE_INPUT_CAP {
        return joined;
    }
    let mut truncated: String = joined.chars().take(CLAUSE_INPUT_CAP).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

fn build_prompt(document: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are analyzing a legal contract. Find every instance of the following \
         clause types in the document.\n\nClause types (use these names exactly):\n",
    );
    for t in ALL_CLAUSE_TYPES {
        let d = t.explanation();
        prompt.push_str(&format!("- {}: {} / {}\n", t.label(), d.en, d.hi));
    }
    prompt.push_str(
        "\nRespond with ONLY a JSON array, no prose, no markdown fences. Each element:\n\
         {\"clause_type\": \"<one of the names above>\", \"extracted_text\": \"<the verbatim clause text>\"}\n\
         If no clauses are found, respond with [].\n\nDocument:\n---\n",
    );
    prompt.push_str(document);
    prompt.push_str("\n---\n");
    prompt
}

/// Parse and validate the model payload. Entries with an unknown
/// clause_type or missing fields are skipped; a payload that is not JSON
/// at all is an error.
fn parse_response(response: &str) -> Result<Vec<(ClauseType, String)>, ServiceError> {
    let json_str = strip_code_fence(response);
    let value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| ServiceError::ClauseIdentification(format!("JSON parse error: {}", e)))?;
    let array = value.as_array().ok_or_else(|| {
        ServiceError::ClauseIdentification("expected a JSON array".to_string())
    })?;

    let mut out = Vec::new();
    for (idx, entry) in array.iter().enumerate() {
        let clause_type = entry
            .get("clause_type")
            .and_then(|v| v.as_str())
            .and_then(ClauseType::from_label);
        let text = entry
            .get("extracted_text")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        match (clause_type, text) {
            (Some(t), Some(s)) => out.push((t, s.to_string())),
            _ => warn!(entry = idx, "skipping malformed or unknown clause entry"),
        }
    }
    Ok(out)
}

/// LLMs sometimes wrap JSON in markdown code blocks despite instructions.
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim();
        }
    }
    trimmed
}

/// Find the page a clause came from by matching a fixed-length prefix of
/// its text against the normalized pages. First match wins; page 1 when
/// nothing matches.
fn locate_page(extracted_text: &str, pages: &[NormalizedPage]) -> u32 {
    let prefix: String = extracted_text.chars().take(PAGE_MATCH_PREFIX).collect();
    if prefix.is_empty() {
        return 1;
    }
    pages
        .iter()
        .find(|p| p.text.contains(&prefix))
        .map(|p| p.number)
        .unwrap_or(1)
}
