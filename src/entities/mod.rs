pub mod prelude;

pub mod carts;
pub mod categories;
pub mod products;
pub mod tokens;
pub mod users;
