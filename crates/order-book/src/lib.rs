pub mod book_side;
pub mod price_level;
pub mod types;

pub use book_side::BookSide;
pub use price_level::PriceLevel;
pub use types::*;
