use crate::error::ApiError;

pub type HandlerResult<T> = Result<T, ApiError>;

pub mod common;
pub mod mods;
