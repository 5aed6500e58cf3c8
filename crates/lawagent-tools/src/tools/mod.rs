pub mod calculator;
pub mod datetime;
pub mod document_generator;
pub mod file_read;
pub mod knowledge_base_search;
pub mod python_executor;
pub mod web_crawler;
pub mod web_search;
pub mod weather;

pub use calculator::CalculatorTool;
pub use datetime::DatetimeTool;
pub use document_generator::DocumentGeneratorTool;
pub use file_read::FileReadTool;
pub use knowledge_base_search::KnowledgeBaseSearchTool;
pub use python_executor::PythonExecutorTool;
pub use web_crawler::WebCrawlerTool;
pub use web_search::WebSearchTool;
pub use weather::WeatherTool;
