use std::sync::Arc;

use crate::chain::{stream_handler, ServerStream, StreamHandler};
use crate::logger::SharedLogger;
use crate::status::Status;

/// Stream handler for methods no service registered.
///
/// Logs the unresolved method and answers `NotFound`.
pub fn unknown_method_handler<S: ServerStream>(logger: SharedLogger) -> StreamHandler<S> {
    stream_handler(move |stream: S| {
        let logger = Arc::clone(&logger);
        async move {
            let method = stream.context().full_method().to_string();
            logger.error(format_args!("unknown grpc method {method}"));
            Err(Status::not_found(format!("unknown method {method}")))
        }
    })
}
