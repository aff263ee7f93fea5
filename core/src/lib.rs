//! Paragraph-level TF-IDF retrieval over a directory of text documents.
//!
//! [`CorpusLoader`] turns a docs directory into provenance-tagged [`Chunk`]s,
//! [`VectorIndex`] ranks them against free-text queries.

pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod query;
pub mod tokenizer;

pub type TermId = u32;

pub use config::RetrievalConfig;
pub use corpus::{Chunk, Corpus, CorpusLoader};
pub use error::{Error, Result};
pub use index::{IndexOptions, VectorIndex, Vocabulary};
pub use query::{QueryResult, RetrievalQuery};
