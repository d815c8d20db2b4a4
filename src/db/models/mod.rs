mod build;
mod cart;
mod product;
mod user;

pub use build::*;
pub use cart::*;
pub use product::*;
pub use user::*;
