//! # tq-core
//!
//! Structured-data querying and the **TOON (Token-Oriented Object Notation)**
//! codec.
//!
//! TOON is a compact, human-readable serialization format designed to reduce
//! LLM token consumption when processing structured data. Objects use
//! indentation instead of braces, uniform arrays of objects collapse into a
//! header plus one row per element, and strings are quoted only when a bare
//! token would read back as something else.
//!
//! The query language is a small jq-like filter language evaluated over
//! streams: one input can produce zero, one or many outputs.
//!
//! ## Quick start
//!
//! ```rust
//! use tq_core::{decode, encode, execute, ToonOptions, Value};
//!
//! let opts = ToonOptions::default();
//! let data: Value = serde_json::from_str(
//!     r#"{"users":[{"id":1,"name":"Alice"},{"id":2,"name":"Bob"}]}"#,
//! ).unwrap();
//!
//! let toon = encode(&data, &opts).unwrap();
//! assert_eq!(toon, "users[2]{id,name}:\n  1,Alice\n  2,Bob");
//! assert_eq!(decode(&toon, &opts).unwrap(), data);
//!
//! let ids = execute(".users[] | select(.id > 1) | .name", &data).unwrap();
//! assert_eq!(ids, vec![Value::from("Bob")]);
//! ```
//!
//! ## Modules
//!
//! - [`value`]: the `Value` tree, number formatting and the numeric-literal rule
//! - [`encoder`]: `Value` → TOON text
//! - [`decoder`]: TOON text → `Value`
//! - [`options`]: `ToonOptions` shared by encoder and decoder
//! - [`query`]: query parser and evaluator
//! - [`error`]: error types for the codec and the query engine

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod options;
pub mod query;
pub mod value;

pub use decoder::{decode, toon_to_json};
pub use encoder::{encode, json_to_toon};
pub use error::{QueryError, ToonError};
pub use options::ToonOptions;
pub use query::{evaluate, execute, parse, Expr};
pub use value::{Map, Value};
