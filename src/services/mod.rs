//! 业务能力层
//!
//! 每个服务只做一件事，不编排流程。

pub mod model_invoker;
pub mod option_shuffler;
pub mod prompt_builder;
pub mod question_extractor;
pub mod response_parser;
pub mod source_fetcher;
pub mod topic_extractor;

pub use model_invoker::{ModelInvoker, RetryPolicy, RetryState};
pub use option_shuffler::{duplicates_correct, shuffle_options, ShuffledOptions};
pub use prompt_builder::{includes_code_examples, PromptBuilder, CODE_EXAMPLE_CATEGORIES};
pub use question_extractor::{clean_answer, ExtractLimits, QuestionExtractor};
pub use response_parser::parse_records;
pub use source_fetcher::{validate_origin, SourceFetcher};
pub use topic_extractor::extract_topics;
