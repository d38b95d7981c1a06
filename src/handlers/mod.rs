pub mod auth;
pub mod db;
pub mod password;
pub mod validation;
pub mod verification;
pub mod whatsapp;
