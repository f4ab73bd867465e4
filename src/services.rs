pub mod access;
pub mod auth;
pub mod batcher;
pub mod inventory_service;
pub mod mailer;
pub mod permissions;
