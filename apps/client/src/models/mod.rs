pub mod space;
pub mod user;
