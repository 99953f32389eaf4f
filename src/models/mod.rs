pub mod coordinate;
pub mod place;
pub mod stats;
pub mod user;
