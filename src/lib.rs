//! # Nyay Saarthi
//!
//! A legal document assistant service: upload a contract in Hindi or
//! English, ask questions about it in simple Hindi, pull out standard
//! contract clauses, and diff two versions of a document.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌─────────────┐
//! │  Extraction  │──▶│  Normalize +  │──▶│  In-memory  │
//! │   cascade    │   │    chunk      │   │   index     │
//! └──────────────┘   └───────┬───────┘   └──────┬──────┘
//!        │                   │                  │
//!        │                   ▼                  ▼
//!        │            ┌────────────┐     ┌────────────┐
//!        │            │  Clauses   │     │  Grounded  │
//!        │            │  (LLM)     │     │    Q&A     │
//!        │            └────────────┘     └────────────┘
//!        ▼
//! ┌──────────────┐
//! │   Compare    │
//! │ (line diff)  │
//! └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Service error taxonomy |
//! | [`extract`] | Extraction strategy cascade (structured, PDF text, OCR) |
//! | [`normalize`] | Text cleaning and noise-page filtering |
//! | [`chunk`] | Overlapping character chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Single-generation semantic index |
//! | [`answer`] | Retrieval-augmented Q&A in simple Hindi |
//! | [`clauses`] | Fixed-vocabulary clause identification |
//! | [`compare`] | Unified line diff of two documents |
//! | [`llm`] | Text generation provider abstraction |
//! | [`ocr`] | PDF rasterization and vision OCR |
//! | [`pipeline`] | Request orchestration and counters |
//! | [`server`] | HTTP API |

pub mod answer;
pub mod chunk;
pub mod clauses;
pub mod compare;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod ocr;
pub mod pipeline;
pub mod server;
