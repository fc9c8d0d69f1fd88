use crate::dates::parse_trade_date;
use crate::enums::PlanAdherence;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Setup label used for trades that were never tagged with one.
pub const UNKNOWN_SETUP: &str = "Unknown";

/// A trade identifier.
///
/// Journals carry both text ids and numeric ones (epoch milliseconds). Two ids
/// are equal when their text is, but a numeric id is written back as a number.
#[derive(Debug, Clone)]
pub struct TradeId {
    value: String,
    numeric: bool,
}

impl TradeId {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            numeric: false,
        }
    }

    pub fn number(value: impl Into<Number>) -> Self {
        Self {
            value: value.into().to_string(),
            numeric: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl PartialEq for TradeId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for TradeId {}

impl PartialEq<str> for TradeId {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for TradeId {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl PartialOrd for TradeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TradeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl Hash for TradeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl From<&str> for TradeId {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for TradeId {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<u64> for TradeId {
    fn from(value: u64) -> Self {
        Self::number(value)
    }
}

impl Serialize for TradeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.numeric.then(|| Number::from_str(&self.value).ok()).flatten() {
            Some(number) => number.serialize(serializer),
            None => serializer.serialize_str(&self.value),
        }
    }
}

impl<'de> Deserialize<'de> for TradeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => TradeId::text(text),
            RawId::Number(number) => TradeId::number(number),
        })
    }
}

/// A single journal entry: one closed or open trade.
///
/// Field names follow the journal's camelCase JSON. Any field this struct does
/// not model is kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub id: TradeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// ISO-8601 timestamp exactly as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "json_number")]
    pub pnl: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "json_number")]
    pub entry: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "json_number")]
    pub stop_loss: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "json_number")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followed_plan: Option<PlanAdherence>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<TradeImage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TradeRecord {
    /// Creates a bare record with only an identifier set.
    pub fn new(id: impl Into<TradeId>) -> Self {
        Self {
            id: id.into(),
            account: None,
            date: None,
            symbol: None,
            pnl: None,
            entry: None,
            stop_loss: None,
            quantity: None,
            setup: None,
            followed_plan: None,
            images: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Realized P&L, with a missing value counted as zero.
    pub fn realized_pnl(&self) -> Decimal {
        self.pnl.unwrap_or(Decimal::ZERO)
    }

    pub fn is_win(&self) -> bool {
        self.realized_pnl() > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.realized_pnl() < Decimal::ZERO
    }

    /// The parsed trade timestamp, or `None` if the date is missing or unreadable.
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.date.as_deref().and_then(parse_trade_date)
    }

    /// Copies every field except `images`, which is replaced.
    pub fn with_images(&self, images: Vec<TradeImage>) -> Self {
        Self {
            id: self.id.clone(),
            account: self.account.clone(),
            date: self.date.clone(),
            symbol: self.symbol.clone(),
            pnl: self.pnl,
            entry: self.entry,
            stop_loss: self.stop_loss,
            quantity: self.quantity,
            setup: self.setup.clone(),
            followed_plan: self.followed_plan.clone(),
            images,
            extra: self.extra.clone(),
        }
    }

    /// The setup tag, falling back to `"Unknown"` for missing or blank tags.
    pub fn setup_label(&self) -> &str {
        match self.setup.as_deref() {
            Some(setup) if !setup.is_empty() => setup,
            _ => UNKNOWN_SETUP,
        }
    }
}

/// The payload of an image attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageContent {
    /// Raw image bytes held in memory.
    Blob(Vec<u8>),
    /// Base64 text, as stored in exports and journal files.
    Encoded(String),
    /// Neither representation was present in the input.
    Empty,
}

/// An image attached to a trade (chart screenshot, fill confirmation...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ImageWire")]
pub struct TradeImage {
    pub name: String,
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    pub content: ImageContent,
}

impl TradeImage {
    pub fn blob(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content: ImageContent::Blob(bytes),
        }
    }

    pub fn encoded(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content: ImageContent::Encoded(data.into()),
        }
    }
}

/// JSON shape of an image: `{name, type, data}`.
#[derive(Deserialize)]
struct ImageWire {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    mime_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

impl From<ImageWire> for TradeImage {
    fn from(wire: ImageWire) -> Self {
        let content = match wire.data {
            Some(data) => ImageContent::Encoded(data),
            None => ImageContent::Empty,
        };
        Self {
            name: wire.name.unwrap_or_default(),
            mime_type: wire.mime_type.unwrap_or_default(),
            content,
        }
    }
}

impl Serialize for TradeImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TradeImage", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("type", &self.mime_type)?;
        match &self.content {
            ImageContent::Encoded(data) => state.serialize_field("data", data)?,
            // Blobs never reach JSON as anything but base64.
            ImageContent::Blob(bytes) => state.serialize_field("data", &BASE64.encode(bytes))?,
            ImageContent::Empty => state.skip_field("data")?,
        }
        state.end()
    }
}

/// Money and prices are read from numbers or numeric strings, and always
/// written as JSON numbers: integers when whole, floats otherwise.
mod json_number {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(value) = value else {
            return serializer.serialize_none();
        };
        if value.fract().is_zero() {
            if let Some(whole) = value.to_i64() {
                return serializer.serialize_i64(whole);
            }
        }
        match value.to_f64() {
            Some(float) => serializer.serialize_f64(float),
            None => serializer.serialize_str(&value.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
        Option::<Decimal>::deserialize(deserializer)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<TradeImage>, D::Error> {
    Ok(Option::<Vec<TradeImage>>::deserialize(deserializer)?.unwrap_or_default())
}
