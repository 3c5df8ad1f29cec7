use crate::error::Error;
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use std::{collections::HashMap, fmt, str::FromStr};

pub type Parameters = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            other => Err(Error::UnknownMethod(other.into())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The response format a request declared when it was captured. It decides which `Accept`
/// header the replayed request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseFormat {
    Json,
    Html,
    Manifest,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "JSON",
            ResponseFormat::Html => "HTML",
            ResponseFormat::Manifest => "MANIFEST",
        }
    }

    pub fn accept_header(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json, text/javascript, */*; q=0.01",
            ResponseFormat::Html => "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ResponseFormat::Manifest => "text/cache-manifest;q=0.9",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JSON" => Ok(ResponseFormat::Json),
            "HTML" => Ok(ResponseFormat::Html),
            "MANIFEST" => Ok(ResponseFormat::Manifest),
            other => Err(Error::UnknownFormat(other.into())),
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured request, ready to be replayed against `host`.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: HttpMethod,
    pub uri: String,
    pub host: String,
    pub format: ResponseFormat,
    pub timestamp: DateTime<FixedOffset>,
    pub parameters: Parameters,
    /// Whole seconds between the earliest request of the parsed batch and this one.
    pub interval: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestData {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}
