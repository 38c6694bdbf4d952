pub mod activity;
pub mod backup;
pub mod building;
pub mod fieldwork;
pub mod notification;
pub mod reports;
pub mod schema;
pub mod territory;
pub mod user;
pub mod visit;
