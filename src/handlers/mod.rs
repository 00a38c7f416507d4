pub mod entries;
pub mod health;
pub mod records;
pub mod reports;
pub mod stats;
