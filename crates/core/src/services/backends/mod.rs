#[cfg(feature = "capstone-backend")]
pub mod capstone;
pub mod listing;

#[cfg(feature = "capstone-backend")]
pub use capstone::CapstoneBackend;
pub use listing::{parse_listing, ListingBackend};
