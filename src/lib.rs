//! paperdigest - daily Hugging Face papers crawler and summarizer.
//!
//! Drives a Chromium session over the daily papers listing, resolves each
//! paper's PDF link, and saves the PDFs into one directory per date.
//! Downloaded papers can then be summarized and questioned through an LLM.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod digest;
pub mod extract;
pub mod library;
pub mod llm;
