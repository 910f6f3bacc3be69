pub mod cart;
pub mod category;
pub mod product;
pub mod token;
pub mod user;
