//! Response envelope.

use serde::Serialize;

/// `{ "data": ... }` wrapper every handler returns its payload in, so
/// clients deserialize one shape whether the body is a row, a list, or a
/// summary. Errors use the `{ "error", "code" }` shape instead.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
