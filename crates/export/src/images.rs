use crate::error::ExportError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use core_types::{ImageContent, TradeImage, TradeRecord};
use futures::future::join_all;
use serde::Serialize;
use std::fmt;

/// Why an image was left out of a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The image had neither a blob nor encoded data.
    MissingContent,
    /// The encoded data was not valid base64.
    MalformedData(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingContent => write!(f, "no image data"),
            SkipReason::MalformedData(detail) => write!(f, "malformed image data ({detail})"),
        }
    }
}

/// An image dropped during conversion, identified well enough to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedImage {
    pub trade_id: String,
    /// Index of the image within the trade's original image list.
    pub position: usize,
    pub name: String,
    pub reason: SkipReason,
}

impl SkippedImage {
    fn new(trade: &TradeRecord, position: usize, image: &TradeImage, reason: SkipReason) -> Self {
        tracing::warn!(
            trade_id = %trade.id,
            position,
            image = %image.name,
            %reason,
            "Dropping image from trade."
        );
        Self {
            trade_id: trade.id.to_string(),
            position,
            name: image.name.clone(),
            reason,
        }
    }

    /// Turns this report into the error a strict caller fails with.
    pub fn into_error(self) -> ExportError {
        ExportError::ImageDecode {
            trade_id: self.trade_id,
            position: self.position,
            name: self.name,
            reason: self.reason,
        }
    }
}

/// Converted trades plus every image that could not be carried over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageConversion {
    pub trades: Vec<TradeRecord>,
    pub skipped: Vec<SkippedImage>,
}

impl ImageConversion {
    /// Fails on the first skipped image, otherwise returns the trades.
    pub fn into_strict(self) -> Result<Vec<TradeRecord>, ExportError> {
        match self.skipped.into_iter().next() {
            Some(skipped) => Err(skipped.into_error()),
            None => Ok(self.trades),
        }
    }
}

/// Replaces every image blob with base64 text.
///
/// All images of all trades are encoded concurrently; each trade keeps its image
/// order. Already-encoded images pass through untouched. Images with no content
/// are dropped and listed in `skipped`.
pub async fn serialize_trades(trades: &[TradeRecord]) -> Result<ImageConversion, ExportError> {
    let encoded = join_all(trades.iter().map(serialize_trade)).await;

    let mut conversion = ImageConversion::default();
    for result in encoded {
        let (trade, skipped) = result?;
        conversion.trades.push(trade);
        conversion.skipped.extend(skipped);
    }
    Ok(conversion)
}

async fn serialize_trade(trade: &TradeRecord) -> Result<(TradeRecord, Vec<SkippedImage>), ExportError> {
    let encoded = join_all(trade.images.iter().map(encode_image)).await;

    let mut images = Vec::with_capacity(trade.images.len());
    let mut skipped = Vec::new();
    for (position, (image, result)) in trade.images.iter().zip(encoded).enumerate() {
        match result? {
            Some(encoded) => images.push(encoded),
            None => skipped.push(SkippedImage::new(trade, position, image, SkipReason::MissingContent)),
        }
    }
    Ok((trade.with_images(images), skipped))
}

async fn encode_image(image: &TradeImage) -> Result<Option<TradeImage>, ExportError> {
    match &image.content {
        ImageContent::Blob(bytes) => {
            let bytes = bytes.clone();
            let data = tokio::task::spawn_blocking(move || BASE64.encode(bytes)).await?;
            Ok(Some(TradeImage::encoded(image.name.clone(), image.mime_type.clone(), data)))
        }
        ImageContent::Encoded(_) => Ok(Some(image.clone())),
        ImageContent::Empty => Ok(None),
    }
}

/// Decodes base64 image data back into blobs.
///
/// Images whose data is missing or malformed are dropped and listed in `skipped`.
/// Images that already hold a blob pass through.
pub fn deserialize_trades(trades: &[TradeRecord]) -> ImageConversion {
    let mut conversion = ImageConversion::default();

    for trade in trades {
        let mut images = Vec::with_capacity(trade.images.len());
        for (position, image) in trade.images.iter().enumerate() {
            match &image.content {
                ImageContent::Encoded(data) => match BASE64.decode(data) {
                    Ok(bytes) => images.push(TradeImage::blob(image.name.clone(), image.mime_type.clone(), bytes)),
                    Err(e) => conversion.skipped.push(SkippedImage::new(
                        trade,
                        position,
                        image,
                        SkipReason::MalformedData(e.to_string()),
                    )),
                },
                ImageContent::Blob(_) => images.push(image.clone()),
                ImageContent::Empty => {
                    conversion
                        .skipped
                        .push(SkippedImage::new(trade, position, image, SkipReason::MissingContent));
                }
            }
        }
        conversion.trades.push(trade.with_images(images));
    }

    conversion
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade_with(images: Vec<TradeImage>) -> TradeRecord {
        let mut trade = TradeRecord::new("t-1");
        trade.symbol = Some("NQ".to_string());
        trade.images = images;
        trade
    }

    #[tokio::test]
    async fn serialize_encodes_blobs_in_order() {
        let trade = trade_with(vec![
            TradeImage::blob("a.png", "image/png", vec![0, 1, 2]),
            TradeImage::encoded("b.png", "image/png", "AAEC"),
            TradeImage::blob("c.jpg", "image/jpeg", b"hello".to_vec()),
        ]);

        let conversion = serialize_trades(std::slice::from_ref(&trade)).await.unwrap();
        assert!(conversion.skipped.is_empty());

        let images = &conversion.trades[0].images;
        let names: Vec<&str> = images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.jpg"]);
        assert_eq!(images[0].content, ImageContent::Encoded("AAEC".to_string()));
        assert_eq!(images[2].content, ImageContent::Encoded("aGVsbG8=".to_string()));
        assert_eq!(images[2].mime_type, "image/jpeg");

        // The input is untouched.
        assert!(matches!(trade.images[0].content, ImageContent::Blob(_)));
    }

    #[tokio::test]
    async fn serialize_reports_images_without_content() {
        let trade = trade_with(vec![
            TradeImage {
                name: "ghost.png".to_string(),
                mime_type: "image/png".to_string(),
                content: ImageContent::Empty,
            },
            TradeImage::blob("real.png", "image/png", vec![9]),
        ]);

        let conversion = serialize_trades(&[trade]).await.unwrap();
        assert_eq!(conversion.trades[0].images.len(), 1);
        assert_eq!(
            conversion.skipped,
            vec![SkippedImage {
                trade_id: "t-1".to_string(),
                position: 0,
                name: "ghost.png".to_string(),
                reason: SkipReason::MissingContent,
            }]
        );
    }

    #[test]
    fn deserialize_restores_blobs_and_reports_bad_data() {
        let trade = trade_with(vec![
            TradeImage::encoded("ok.png", "image/png", "aGVsbG8="),
            TradeImage::encoded("bad.png", "image/png", "not base64!!"),
        ]);

        let conversion = deserialize_trades(&[trade]);
        assert_eq!(conversion.trades[0].images, vec![TradeImage::blob("ok.png", "image/png", b"hello".to_vec())]);
        assert_eq!(conversion.skipped.len(), 1);
        assert_eq!(conversion.skipped[0].position, 1);
        assert!(matches!(conversion.skipped[0].reason, SkipReason::MalformedData(_)));
    }

    #[test]
    fn strict_conversion_fails_on_first_skip() {
        let trade = trade_with(vec![TradeImage::encoded("bad.png", "image/png", "@@@")]);
        let err = deserialize_trades(&[trade]).into_strict().unwrap_err();
        match err {
            ExportError::ImageDecode { trade_id, name, .. } => {
                assert_eq!(trade_id, "t-1");
                assert_eq!(name, "bad.png");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_image_fields_survive() {
        let mut trade = trade_with(vec![TradeImage::encoded("a.png", "image/png", "AA==")]);
        trade.extra.insert("notes".to_string(), serde_json::json!("held too long"));

        let conversion = deserialize_trades(std::slice::from_ref(&trade));
        let restored = &conversion.trades[0];
        assert_eq!(restored.symbol, trade.symbol);
        assert_eq!(restored.extra, trade.extra);
    }
}
