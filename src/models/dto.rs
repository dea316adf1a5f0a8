use serde::Serialize;

/// Envelope every successful response is wrapped in: `{"data": <payload>}`.
#[derive(Debug, Serialize)]
pub struct Dto<T> {
    pub data: T,
}
