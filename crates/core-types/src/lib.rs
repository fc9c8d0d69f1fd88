pub mod dates;
pub mod enums;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use dates::parse_trade_date;
pub use enums::PlanAdherence;
pub use structs::{ImageContent, TradeId, TradeImage, TradeRecord};
