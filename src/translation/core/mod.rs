//! 翻译系统核心模块
//!
//! ## 模块依赖关系
//!
//! ```text
//! PageTranslator (orchestrator.rs)
//!     ├── PageHarvester (pipeline/harvester.rs)
//!     ├── PipelineRun (run.rs)
//!     │       └── BatchManager (pipeline/batch.rs)
//!     ├── EventBus (events.rs)
//!     └── TranslationAdapter (adapter.rs)
//!             ├── RemoteTranslator (remote.rs)
//!             ├── OfflineDictionary (dictionary.rs)
//!             └── TranslationCache (storage/cache.rs)
//!
//! ElementTranslator (element.rs)  ← 订阅 LanguageChanged 事件
//! ```

pub mod adapter;
pub mod dictionary;
pub mod element;
pub mod events;
pub mod languages;
pub mod orchestrator;
pub mod remote;
pub mod run;

pub use adapter::{AdapterOptions, BackendMode, BatchOutput, Origin, TranslationAdapter};
pub use dictionary::OfflineDictionary;
pub use element::{ElementReport, ElementTranslator};
pub use events::{EventBus, RunStatus, TranslationEvent};
pub use languages::{Language, SUPPORTED_LANGUAGES};
pub use orchestrator::{PageTranslator, RunHandle};
pub use remote::{GoogleTranslateClient, RemoteTranslator};
pub use run::{RunReport, RunSettings, RunState, TranslationOutcome};
