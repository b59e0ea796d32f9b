pub mod client;
pub mod csrf;
pub mod endpoints;
pub mod error;
pub mod traits;

pub use client::ApiClient;
pub use csrf::CookieCsrfSource;
pub use endpoints::post_first;
pub use error::ApiError;
pub use traits::TokenSource;
