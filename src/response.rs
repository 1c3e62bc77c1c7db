//! Response writer handed to handlers.
//!
//! Buffers the status line, headers and body of one response and keeps the
//! counters the request log needs: the status set by [`write_header`] (0 until
//! then), the number of body bytes written and whether anything was written at
//! all.
//!
//! [`write_header`]: ResponseWriter::write_header

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use std::io;

use crate::Response;

#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response status. Later calls overwrite earlier ones.
    pub fn write_header(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Append `buf` to the body, implying `200 OK` if no status was set yet.
    pub fn write_bytes(&mut self, buf: &[u8]) -> usize {
        if !self.written() {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        buf.len()
    }

    pub fn write_str(&mut self, data: &str) -> usize {
        self.write_bytes(data.as_bytes())
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Status set so far, `0` if none.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status.map_or(0, |s| s.as_u16())
    }

    /// Body bytes written so far.
    #[must_use]
    pub fn size(&self) -> usize {
        self.body.len()
    }

    #[must_use]
    pub fn written(&self) -> bool {
        self.status.is_some() || !self.body.is_empty()
    }

    /// Finish the response; an untouched writer becomes an empty `200 OK`.
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_bytes(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_status_and_size_tracking() {
        let mut rw = ResponseWriter::new();
        assert_eq!(rw.status(), 0);
        assert_eq!(rw.size(), 0);
        assert!(!rw.written());

        rw.write_str("hello");
        assert_eq!(rw.status(), 200);
        assert_eq!(rw.size(), 5);
        assert!(rw.written());

        write!(rw, " {}", "world").unwrap();
        assert_eq!(rw.size(), 11);

        let response = rw.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), b"hello world");
    }

    #[test]
    fn test_explicit_status_is_kept() {
        let mut rw = ResponseWriter::new();
        rw.write_header(StatusCode::NOT_FOUND);
        assert!(rw.written());
        rw.write_str("missing");
        assert_eq!(rw.status(), 404);
        assert_eq!(rw.into_response().status(), StatusCode::NOT_FOUND);
    }
}
