//! Tailor API — LLM-backed resume tailoring service.
//!
//! The flow, end to end: a resume and a job description come in, the primary
//! tailoring task produces a rewritten resume plus ATS scores, the repair
//! layer makes the model's output well-typed, and the report coordinator
//! caches and incrementally enriches the result with lazily-requested
//! regions (cover letter, skill analysis, interview prep, career path).

pub mod cache;
pub mod config;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod llm;
pub mod repair;
pub mod report;
pub mod routes;
pub mod schema;
pub mod state;
pub mod tasks;
