pub mod config;
pub mod dates;
pub mod keywords;
pub mod text;
pub mod types;
pub mod venues;

pub use config::Config;
pub use dates::{parse_show_date, ShowDate};
pub use keywords::{extract_notes, special_signal, union_notes, SPECIAL_KEYWORDS};
pub use text::{clean_title, normalize_title};
pub use types::{Screening, Tier};
pub use venues::{normalize_venue, VenueMatch};
