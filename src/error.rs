use hyper::http;
use std::{fmt::Display, io, time::Duration};

#[derive(Debug)]
pub enum Error {
    IoError(io::Error),
    InvalidTimestamp(String),
    InvalidParameters(serde_json::Error),
    InvalidConcurrency,
    InvalidSpeed(f64),
    MissingHost,
    NoRuntime,
    UnknownMethod(String),
    UnknownFormat(String),
    InvalidHeaderName,
    InvalidHeaderValue,
    ParseUriError(String),
    TooManyRedirects(usize),
    Timeout(Duration),
    HyperError(hyper::Error),
    HttpError(http::Error),
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IoError: {}", e),
            Error::InvalidTimestamp(text) => {
                write!(f, "Couldn't parse the request time \"{}\"", text)
            }
            Error::InvalidParameters(e) => write!(f, "Invalid parameters literal: {}", e),
            Error::InvalidConcurrency => write!(f, "The concurrency should be at least 1"),
            Error::InvalidSpeed(speed) => {
                write!(f, "The speed should be a positive number, got {}", speed)
            }
            Error::MissingHost => write!(f, "The target host hasn't been configured"),
            Error::NoRuntime => write!(f, "Replays can only be scheduled inside a tokio runtime"),
            Error::UnknownMethod(method) => write!(f, "Unknown HTTP method \"{}\"", method),
            Error::UnknownFormat(format) => write!(f, "Unknown response format \"{}\"", format),
            Error::InvalidHeaderName => write!(f, "Invalid header name"),
            Error::InvalidHeaderValue => write!(f, "Invalid header value"),
            Error::ParseUriError(uri) => write!(f, "Parse URI Error: {}", uri),
            Error::TooManyRedirects(max) => write!(f, "Maximum ({}) redirects followed", max),
            Error::Timeout(timeout) => {
                write!(f, "Request timed out after {} seconds", timeout.as_secs())
            }
            Error::HyperError(e) => write!(f, "Hyper error: {}", e),
            Error::HttpError(e) => write!(f, "Http Error: {}", e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidParameters(e)
    }
}

impl From<hyper::header::InvalidHeaderName> for Error {
    fn from(_: hyper::header::InvalidHeaderName) -> Self {
        Error::InvalidHeaderName
    }
}

impl From<hyper::header::InvalidHeaderValue> for Error {
    fn from(_: hyper::header::InvalidHeaderValue) -> Self {
        Error::InvalidHeaderValue
    }
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Self {
        Error::HyperError(e)
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::HttpError(e)
    }
}
