//! # Sales Pulse
//!
//! Monthly sales spreadsheets in, answers from an AI assistant out.
//!
//! ## Core Concepts
//!
//! - **Month slots**: twelve storage slots (0 = Janeiro .. 11 = Dezembro), each holding one
//!   uploaded spreadsheet as normalized records plus the records exactly as parsed
//! - **Normalized columns**: headers lowercased, accents stripped, punctuation folded to `_`
//! - **Aggregation**: every stored month concatenated in calendar order and stamped with
//!   `month_name` / `month_index`
//! - **Sampling**: at most 500 records go to the assistant, split evenly across loaded
//!   months with a floor of 10 per month, always the leading rows of each month
//! - **Bridge**: a prompt built from the sample is forwarded to a chat-completion service
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_pulse::*;
//! use sales_pulse::llm::{ChatCompletionClient, SalesAssistant};
//!
//! let store = MemoryStore::new();
//! let csv = "Produto,Quantidade,Valor\nCafé,2,10.5\nChá,1,4\n";
//! SheetIngestor::new(&store).ingest_bytes(0, csv.as_bytes(), SheetFormat::Csv)?;
//!
//! let records = aggregate(&store)?;
//! let months = loaded_month_names(&store)?;
//! let assistant = SalesAssistant::new(ChatCompletionClient::new(api_key));
//! let answer = assistant.ask("Qual o faturamento total?", &records, &months).await?;
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod normalize;
pub mod sampling;
pub mod schema;
pub mod storage;

#[cfg(feature = "llm")]
pub mod chat;
#[cfg(feature = "llm")]
pub mod llm;
#[cfg(feature = "server")]
pub mod server;

pub use aggregator::{aggregate, all_months_loaded, loaded_month_names, loaded_months};
pub use config::BridgeConfig;
pub use error::{Result, SalesPulseError};
pub use ingestion::{parse_sheet, IngestReport, SheetFormat, SheetIngestor, MIN_COLUMNS};
pub use normalize::{normalize_column_name, normalize_record};
pub use sampling::{select_sample, SampleBudget};
pub use schema::*;
pub use storage::{FileStore, KeyValueStore, MemoryStore};

#[cfg(feature = "llm")]
pub use chat::ChatSession;
