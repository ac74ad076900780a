//! 业务能力层（Services）
//!
//! 描述"我能做什么"，不关心对话顺序

pub mod file_catalog;
pub mod llm_service;
pub mod question_generator;
pub mod test_generation;
pub mod text_decoder;

pub use file_catalog::FileCatalog;
pub use llm_service::LlmService;
pub use question_generator::QuestionGenerator;
pub use test_generation::{parse_question_count, GeneratedArtifact, TestGenerationPipeline};
pub use text_decoder::{TextDecoder, TextEncoding};
