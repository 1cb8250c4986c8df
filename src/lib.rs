//! Transliteration orchestration for a segmented Sanskrit corpus reader.
//!
//! Conversion itself is delegated to a [`backend::ConversionBackend`]; this
//! crate owns script selection, caching, fallback and change notification.

pub mod backend;
pub mod cache;
pub mod corpus;
pub mod engine;
pub mod script;
pub mod settings;
pub mod store;
pub mod table;
pub mod trace_init;
pub mod unicode;

pub use backend::{ConversionBackend, EmbeddedConversion, RemoteServiceConversion};
pub use engine::{EngineError, EngineEvent, EngineOptions, ListenerId, TransliterationEngine};
pub use script::{ScriptDescriptor, DEFAULT_SCRIPT, SOURCE_SCRIPT};
pub use store::ReaderStore;
pub use table::TransliterationTable;

use std::any::Any;

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
