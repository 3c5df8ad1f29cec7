use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STARTED_LINE_REGEX: Regex = Regex::new(
        "(?m)^[ \\t]*Started (?P<method>\\w+) \"(?P<uri>.*)\" \
            for (?P<ip>\\d+\\.\\d+\\.\\d+\\.\\d+) at (?P<time>.*)$"
    )
    .unwrap();
    static ref NEXT_REQUEST_LINE_REGEX: Regex = Regex::new(
        "(?m)^[ \\t]*(?:Started |Processing by .* as (?P<format>\\S+)[ \\t\\r]*$)"
    )
    .unwrap();
    static ref PARAMETERS_LINE_REGEX: Regex =
        Regex::new("(?m)\\A\\n[ \\t]*Parameters: (?P<parameters>\\{.*\\})[ \\t\\r]*$").unwrap();
}

const REPLAYABLE_METHODS: &[&str] = &["GET", "POST"];
const REPLAYABLE_FORMATS: &[&str] = &["JSON", "HTML", "MANIFEST"];

/// The raw captures of one log block, before the time and the parameters are interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub ip: &'a str,
    pub time: &'a str,
    pub format: &'a str,
    pub parameters: Option<&'a str>,
}

/// Matches a block like
///
/// ```text
/// Started GET "/sitemaps/xs/1.xml" for 127.0.0.1 at Thu Mar 24 14:04:35 +0800 2011
///   Processing by SitemapsController#books as HTML
///   Parameters: {"page"=>"1"}
/// ```
///
/// The format comes from the first processing line after the start line, and the parameters
/// only from the line right below it. Returns `None` when the start or the processing line is
/// missing, when another request starts before the processing line, or when the method or
/// the format is not one that can be replayed.
pub fn match_block(block: &str) -> Option<RawRecord<'_>> {
    let started = STARTED_LINE_REGEX.captures(block)?;
    let method = started.name("method")?.as_str();
    if !REPLAYABLE_METHODS.contains(&method) {
        return None;
    }

    let rest = &block[started.get(0)?.end()..];
    let processing = NEXT_REQUEST_LINE_REGEX.captures(rest)?;
    let format = processing.name("format")?.as_str();
    if !REPLAYABLE_FORMATS.contains(&format) {
        return None;
    }

    let parameters = PARAMETERS_LINE_REGEX
        .captures(&rest[processing.get(0)?.end()..])
        .and_then(|captures| captures.name("parameters"))
        .map(|m| m.as_str());

    Some(RawRecord {
        method,
        uri: started.name("uri")?.as_str(),
        ip: started.name("ip")?.as_str(),
        time: started.name("time")?.as_str().trim(),
        format,
        parameters,
    })
}
