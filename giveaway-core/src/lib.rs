pub mod draw;
pub mod error;
pub mod error_utils;
pub mod links;
pub mod rank;
pub mod tally;
pub mod types;

pub use draw::draw_winner;
pub use error::*;
pub use error_utils::*;
pub use links::extract_recipe_ids;
pub use rank::rank;
pub use tally::{tally, total_entries};
pub use types::*;
