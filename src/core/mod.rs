//! Core modules for Confidence Tracker

pub mod date_normalizer;
pub mod categorizer;
pub mod grammar;
pub mod extractor;
pub mod ingest;
pub mod analysis;
pub mod storage;
pub mod api;

pub use date_normalizer::{DateNormalizer, find_date_expression, is_iso_date};
pub use categorizer::HeuristicCategorizer;
pub use grammar::{Grammar, JsonGrammar, LabeledGrammar, LegacyGrammar};
pub use extractor::{EntryExtractor, ParsedTranscription, BLOB_DOMINANT_BASIS};
pub use ingest::{Ingestor, transcribe};
pub use analysis::{Analyzer, Observation, find_streaks, priority_score, classify_trend, pearson, quantile};
pub use storage::{save_dataset, load_dataset, open_dataset, save_report, run_timestamp, transcription_path};
pub use api::{create_router, run_server};
