#![forbid(unsafe_code)]

//! Character-set handling for FrankenTerm.
//!
//! Turns a user-facing encoding name into a codepage and builds the lookup
//! tables a terminal needs to draw incoming bytes and encode outgoing text:
//!
//! - [`catalog`] - the named encodings, in display order
//! - [`resolve`] / [`name_of`] - encoding name <-> [`CodepageId`]
//! - [`ConversionTableSet`] - font, OEM, SCO, line and xterm tables plus the
//!   reverse map for the line codepage
//! - [`ConversionTableSet::decode`] / [`ConversionTableSet::encode`] - bulk
//!   conversion
//! - [`ConversionTableSet::class_of`] - word-boundary class of a rendered
//!   character
//! - [`CodepageSession`] - the active table set, swapped atomically on
//!   reconfiguration
//!
//! Platform codec services come in through [`CodepageHost`];
//! [`PortableHost`] is a ready-made implementation on top of `encoding_rs`.
//!
//! # Example
//! ```
//! use frankenterm_charset::{CodepageSession, EncodingConfig, Glyph, PortableHost, WordClass};
//!
//! let session = CodepageSession::new(
//!     PortableHost::default(),
//!     &EncodingConfig::default().with_charset("KOI8-U"),
//! );
//! assert_eq!(session.decode_line(&[0xC1]), vec!['а']);
//! assert_eq!(session.encode_line(&['а']), vec![0xC1]);
//! assert_eq!(session.class_of(Glyph::Char('あ')), WordClass::WideScript);
//! ```

mod builtin;
pub mod catalog;
pub mod config;
pub mod convert;
pub mod error;
pub mod glyph;
pub mod host;
pub mod resolver;
pub mod session;
pub mod tables;
pub mod word;

pub use catalog::CatalogEntry;
pub use config::EncodingConfig;
pub use convert::is_lead_byte;
pub use error::{ConfigError, EncodingError};
pub use glyph::{Charset, FontPage, Glyph};
pub use host::{CodepageHost, CodepageInfo, ConvertFlags, PortableHost};
pub use resolver::{CodepageId, name_of, resolve};
pub use session::{CodepageSession, Resolution};
pub use tables::{ConversionTableSet, ReverseTable, TableMode};
pub use word::{WordClass, classify};
