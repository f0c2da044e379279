//! Application services: export pipeline and article lifecycle.

pub mod error;
pub mod export;
pub mod markup;
pub mod publish;
