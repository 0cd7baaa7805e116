//! Response envelope for API handlers.
//!
//! JSON responses are wrapped as `{ "data": ... }`. Empty (204) responses and
//! export archives are not.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
