//! # Trade Journal Export Codec
//!
//! Turns a trade collection, image attachments included, into a single
//! password-protected text payload and back again.
//!
//! ## Layers
//!
//! - `images`: blob ⇄ base64 conversion of every trade image. Dropped images are
//!   always reported, never lost silently.
//! - `crypto`: PBKDF2-HMAC-SHA256 key derivation and AES-256-GCM encryption. A wrong
//!   password and a tampered file both surface as `ExportError::Authentication`.
//! - `bundle`: The full pipeline, `TradeExporter`.

pub mod bundle;
pub mod crypto;
pub mod error;
pub mod images;

pub use bundle::{ExportOptions, TradeExporter, export_trades, import_trades};
pub use crypto::{
    DEFAULT_KDF_ITERATIONS, EncryptedPayload, PasswordCipher, decrypt_string, encrypt_string,
};
pub use error::ExportError;
pub use images::{ImageConversion, SkipReason, SkippedImage, deserialize_trades, serialize_trades};
