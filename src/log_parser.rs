use crate::{
    data::{HttpMethod, Parameters, Request, ResponseFormat},
    error::Error,
    log_format, parameters,
};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%a %b %d %H:%M:%S %z %Y",
    "%a %b %e %H:%M:%S %z %Y",
    "%d/%b/%Y:%H:%M:%S %z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%a %b %d %H:%M:%S %Y",
    "%a %b %e %H:%M:%S %Y",
];

/// A matched block whose time has been read. Its interval needs the earliest time of the
/// whole batch.
struct TimedRecord {
    method: HttpMethod,
    uri: String,
    format: ResponseFormat,
    timestamp: DateTime<FixedOffset>,
    parameters: Parameters,
}

impl TimedRecord {
    fn into_request(self, host: &str, start_time: DateTime<FixedOffset>) -> Request {
        let elapsed = self.timestamp.signed_duration_since(start_time);

        Request {
            method: self.method,
            uri: self.uri,
            host: host.into(),
            format: self.format,
            timestamp: self.timestamp,
            parameters: self.parameters,
            interval: elapsed.num_seconds().max(0) as u64,
        }
    }
}

/// Parses the captured requests out of `blocks`, in block order. Blocks that don't describe
/// a replayable request are skipped; a request whose time can't be read fails the whole call.
pub fn parse<S: AsRef<str>>(blocks: &[S], host: &str) -> Result<Vec<Request>, Error> {
    let mut records = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        match parse_block(block.as_ref())? {
            Some(record) => records.push(record),
            None => debug!("Skipping block {}: no request matched", index),
        }
    }

    let start_time = match records.iter().map(|r| r.timestamp).min() {
        Some(start_time) => start_time,
        None => return Ok(Vec::new()),
    };

    Ok(records
        .into_iter()
        .map(|record| record.into_request(host, start_time))
        .collect())
}

fn parse_block(block: &str) -> Result<Option<TimedRecord>, Error> {
    let record = match log_format::match_block(block) {
        Some(record) => record,
        None => return Ok(None),
    };

    let timestamp = parse_time(record.time)?;
    let parameters = record
        .parameters
        .map(parameters::decode_or_default)
        .unwrap_or_else(Parameters::new);

    Ok(Some(TimedRecord {
        method: record.method.parse()?,
        uri: record.uri.into(),
        format: record.format.parse()?,
        timestamp,
        parameters,
    }))
}

/// Reads the request time as Rails prints it (`2011-03-17 11:53:55 +0800`,
/// `Thu Mar 24 14:04:35 +0800 2011`) or as RFC 3339 / RFC 2822. Times without an offset are
/// taken as UTC.
pub fn parse_time(text: &str) -> Result<DateTime<FixedOffset>, Error> {
    let text = text.trim();
    let normalized = match text.strip_suffix(" UTC") {
        Some(stripped) => format!("{} +0000", stripped),
        None => text.to_string(),
    };

    if let Ok(time) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(time);
    }
    if let Ok(time) = DateTime::parse_from_rfc2822(&normalized) {
        return Ok(time);
    }

    for format in OFFSET_FORMATS {
        if let Ok(time) = DateTime::parse_from_str(&normalized, format) {
            return Ok(time);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(time) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(Utc.from_utc_datetime(&time).into());
        }
    }

    Err(Error::InvalidTimestamp(text.into()))
}
