// Re-export all model types
pub use self::budget::*;
pub use self::cart::*;
pub use self::catalog::*;
pub use self::enums::*;
pub use self::errors::*;
pub use self::expenditure::*;
pub use self::home::*;
pub use self::member::*;
pub use self::response::*;
pub use self::validation::*;

mod budget;
mod cart;
mod catalog;
mod enums;
mod errors;
mod expenditure;
mod home;
mod member;
mod response;
mod validation;
