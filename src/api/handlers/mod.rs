pub mod avatars;
pub mod health;
pub mod products;
