//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, catch-all handler)
//!     → request.rs (request ID, path decoding, method/path/query extraction)
//!     → site::Site::handle on a blocking worker
//!     → response.rs (Reply into an HTTP response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, RequestError, X_REQUEST_ID};
pub use response::Reply;
pub use server::HttpServer;
