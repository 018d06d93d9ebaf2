//! S3-compatible HTTP front-end.
//!
//! Translates HTTP verbs, headers, query parameters, and XML bodies
//! into driver operations and back:
//!
//! - **Routing** ([`router`]): path-style addressing, operation
//!   identification from method + path shape + multipart query
//!   parameters.
//! - **Handlers** ([`handlers`]): one handler per operation —
//!   authorization, header validation, driver dispatch.
//! - **Responses** ([`response`]): XML/JSON content negotiation, the
//!   `<Error>` document, common headers.
//! - **Range** ([`range`]): the `bytes=` Range grammar against a known
//!   object size.
//! - **Service** ([`service`]): the hyper `Service` gluing it together.
//!
//! # Request lifecycle
//!
//! ```text
//! HTTP request
//!   -> S3Service (collect body)
//!   -> ApiHandler::handle (route, authorize, validate, dispatch)
//!   -> Driver (ministore-core)
//!   <- typed response or DriverError -> ApiError -> <Error> document
//! ```

pub mod body;
pub mod error;
pub mod handlers;
pub mod range;
pub mod response;
pub mod router;
pub mod service;

pub use body::ResponseBody;
pub use error::{ApiError, ApiErrorCode};
pub use handlers::{AllowAll, ApiHandler, Authorizer};
pub use router::{RoutingContext, S3Operation};
pub use service::S3Service;
