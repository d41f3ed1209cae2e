//! API data models.

pub mod user;
pub mod validation;

pub use user::{User, UserCreateDto, UserResponseDto};
pub use validation::FieldError;
