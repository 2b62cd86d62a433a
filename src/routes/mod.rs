pub mod auth;
pub mod categories;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod reports;
pub mod staff;
pub mod tables;
