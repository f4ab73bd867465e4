pub mod admin;
pub mod auth;
pub mod categories;
pub mod history;
pub mod items;
pub mod organizations;
pub mod stores;
pub mod users;
