use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{json, Value};

use crate::router::ResponseFormat;

/// JSend response status. `success` and `fail` carry a `data` payload,
/// `error` carries a `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    Fail,
    Error,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Success => "success",
            ResponseStatus::Fail => "fail",
            ResponseStatus::Error => "error",
        }
    }
}

/// A fully serialized API response, ready for whatever transport carries
/// it: status line parts, content headers, and the encoded body.
#[derive(Debug)]
pub struct EncodedResponse {
    pub http_status: u16,
    pub reason: &'static str,
    pub content_type: &'static str,
    pub content_length: usize,
    pub location: Option<String>,
    pub body: String,
}

/// Builds the JSend envelope around `payload` and serializes it in the
/// requested format.
pub fn encode(
    status: ResponseStatus,
    payload: Value,
    http_status: u16,
    format: ResponseFormat,
    location: Option<String>,
) -> EncodedResponse {
    let envelope = match status {
        ResponseStatus::Success | ResponseStatus::Fail => json!({
            "status": status.as_str(),
            "data": payload,
        }),
        ResponseStatus::Error => json!({
            "status": status.as_str(),
            "message": payload,
        }),
    };

    let (body, content_type) = match format {
        ResponseFormat::Json => (envelope.to_string(), "application/json"),
        ResponseFormat::Xml => (xml_encode("response", &envelope), "application/xml"),
    };

    EncodedResponse {
        http_status,
        reason: reason_phrase(http_status),
        content_type,
        content_length: body.len(),
        location,
        body,
    }
}

/// Serializes a JSON value as an XML document: objects become child
/// elements named after their keys, array items become `<item>` elements,
/// scalars become text nodes.
pub fn xml_encode(root: &str, value: &Value) -> String {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    // Writing into an in-memory buffer does not fail.
    write_value(&mut writer, root, value).unwrap();
    String::from_utf8(writer.into_inner().into_inner()).unwrap()
}

fn write_value(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    tag: &str,
    value: &Value,
) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                write_value(writer, key, child)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                write_value(writer, "item", item)?;
            }
        }
        Value::Null => {}
        Value::String(text) => {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        other => {
            writer.write_event(Event::Text(BytesText::new(&other.to_string())))?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Reason phrase for an HTTP status code; unknown codes report the 500
/// phrase.
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => "Internal Server Error",
    }
}
