//! Retrieval-augmented question answering.
//!
//! A question is embedded, the top-k chunks are pulled from the active
//! index, and their texts are assembled into a single bounded context.
//! The generation capability is invoked once with a grounded instruction
//! that pins the answer to that context, in simple Hindi, and tells the
//! model to admit when the context is insufficient rather than invent.

use std::sync::Arc;

use tracing::debug;

use crate::config::RetrievalConfig;
use crate::error::ServiceError;
use crate::index::{ScoredChunk, SemanticIndex};
use crate::llm::TextGenerator;
use crate::models::{QueryResult, SourceRef};

pub struct Answerer {
    index: Arc<SemanticIndex>,
    generator: Arc<dyn TextGenerator>,
    top_k: usize,
    max_context_chars: usize,
}

impl Answerer {
    pub fn new(
        index: Arc<SemanticIndex>,
        generator: Arc<dyn TextGenerator>,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            index,
            generator,
            top_k: retrieval.top_k,
            max_context_chars: retrieval.max_context_chars,
        }
    }

    /// Answer a question against the active index. Fails with
    /// [`ServiceError::NoActiveIndex`] before the first successful upload.
    pub async fn ask(&self, question: &str) -> Result<QueryResult, ServiceError> {
        let mut hits = self.index.query(question, self.top_k).await?;
        debug!(hits = hits.len(), "retrieved chunks for question");

        let (context, used) = bounded_context(&hits, self.max_context_chars);
        let prompt = build_prompt(&context, question);
        let answer = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| ServiceError::Generation(e.to_string()))?;

        // Only the chunks the model actually saw are cited as sources.
        hits.truncate(used);
        let sources = hits
            .into_iter()
            .map(|h| SourceRef {
                content: h.chunk.text,
                page: h.chunk.page,
            })
            .collect();

        Ok(QueryResult {
            answer: answer.trim().to_string(),
            sources,
        })
    }
}

/// Concatenate chunk texts in retrieval order, stopping before the first
/// chunk that would push the context past the cap. At least one chunk is
/// always included so a single oversized chunk still yields an answer.
/// Returns the context and how many chunks went into it.
fn bounded_context(hits: &[ScoredChunk], max_chars: usize) -> (String, usize) {
    let mut context = String::new();
    let mut chars_used = 0usize;
    let mut used = 0usize;
    for (i, hit) in hits.iter().enumerate() {
        let chunk_chars = hit.chunk.text.chars().count();
        if i > 0 && chars_used + chunk_chars > max_chars {
            break;
        }
        if i > 0 {
            context.push_str("\n\n");
            chars_used += 2;
        }
        context.push_str(&hit.chunk.text);
        chars_used += chunk_chars;
        used += 1;
    }
    (context, used)
}

fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "दिए गए संदर्भ का उपयोग करके निम्नलिखित प्रश्न का उत्तर सरल हिंदी में दें। \
         उत्तर केवल संदर्भ में दी गई जानकारी पर आधारित होना चाहिए। \
         यदि संदर्भ में उत्तर देने के लिए पर्याप्त जानकारी नहीं है, तो स्पष्ट रूप से कहें \
         कि दस्तावेज़ में यह जानकारी उपलब्ध नहीं है। \
         यदि प्रश्न में किसी संख्या या सूची की माँग हो, तो संदर्भ में मौजूद हर मेल खाने वाला \
         बिंदु निकालें और सूचीबद्ध करें। कोई भी बिंदु न छोड़ें। \
         यदि उत्तर में कई बिंदु हों, तो उन्हें क्रमांकित सूची में प्रस्तुत करें।\n\n\
         संदर्भ:\n{}\n\nप्रश्न: {}\n\nउत्तर:",
        context, question
    )
}
