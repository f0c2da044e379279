//! Signed multipart transport for the publishing API.

pub mod client;
pub mod error;
pub mod multipart;
pub mod response;
pub mod signing;

pub use self::{
    client::PublishClient,
    error::PublishError,
    signing::Credentials,
};
