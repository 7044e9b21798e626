pub mod api;
pub mod choice;
pub mod mongodb;
pub mod question;
