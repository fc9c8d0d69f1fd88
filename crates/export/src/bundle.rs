use crate::crypto::{DEFAULT_KDF_ITERATIONS, EncryptedPayload, PasswordCipher};
use crate::error::ExportError;
use crate::images::{ImageConversion, deserialize_trades, serialize_trades};
use core_types::TradeRecord;

/// Knobs for the export/import pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub kdf_iterations: u32,
    /// Fail instead of dropping images that can't be converted.
    pub strict_images: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            strict_images: true,
        }
    }
}

/// Packs a trade collection into one encrypted, text-only payload and back.
///
/// Export: encode image blobs → JSON → encrypt. Import runs the same steps in reverse.
#[derive(Debug, Clone)]
pub struct TradeExporter {
    cipher: PasswordCipher,
    strict_images: bool,
}

impl TradeExporter {
    pub fn new(options: ExportOptions) -> Result<Self, ExportError> {
        Ok(Self {
            cipher: PasswordCipher::new(options.kdf_iterations)?,
            strict_images: options.strict_images,
        })
    }

    pub async fn export(&self, trades: &[TradeRecord], password: &str) -> Result<EncryptedPayload, ExportError> {
        let conversion = serialize_trades(trades).await?;
        let (trades, dropped) = self.settle(conversion)?;

        let plain_text = serde_json::to_string(&trades)?;
        let payload = self.cipher.encrypt(&plain_text, password).await?;

        tracing::info!(trades = trades.len(), dropped_images = dropped, "Exported trades.");
        Ok(payload)
    }

    /// Decrypts and decodes a payload. In lenient mode the returned conversion
    /// lists the images that had to be dropped.
    pub async fn import(&self, payload: &EncryptedPayload, password: &str) -> Result<ImageConversion, ExportError> {
        let plain_text = self.cipher.decrypt(payload, password).await?;
        let trades: Vec<TradeRecord> = serde_json::from_str(&plain_text)?;

        let conversion = deserialize_trades(&trades);
        if self.strict_images {
            if let Some(skipped) = conversion.skipped.first() {
                return Err(skipped.clone().into_error());
            }
        }

        tracing::info!(
            trades = conversion.trades.len(),
            dropped_images = conversion.skipped.len(),
            "Imported trades."
        );
        Ok(conversion)
    }

    fn settle(&self, conversion: ImageConversion) -> Result<(Vec<TradeRecord>, usize), ExportError> {
        let dropped = conversion.skipped.len();
        if self.strict_images {
            return Ok((conversion.into_strict()?, dropped));
        }
        Ok((conversion.trades, dropped))
    }
}

impl Default for TradeExporter {
    fn default() -> Self {
        Self {
            cipher: PasswordCipher::default(),
            strict_images: true,
        }
    }
}

/// Exports with default options.
pub async fn export_trades(trades: &[TradeRecord], password: &str) -> Result<EncryptedPayload, ExportError> {
    TradeExporter::default().export(trades, password).await
}

/// Imports with default options, returning trades with image blobs restored.
pub async fn import_trades(payload: &EncryptedPayload, password: &str) -> Result<Vec<TradeRecord>, ExportError> {
    Ok(TradeExporter::default().import(payload, password).await?.trades)
}
