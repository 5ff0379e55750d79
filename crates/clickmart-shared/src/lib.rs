//! # Clickmart Shared
//!
//! Types shared between the API server and its clients: request/response
//! DTOs and the standardized error body.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
