//! Plain-text event formatter that prefixes the search span id and masks secrets.
//!
//! Fields named like credentials are replaced wholesale; bearer-style key
//! tokens (`sk-...`, `gsk_...`) anywhere in a line keep their prefix only.

use std::fmt;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

const SENSITIVE_FIELDS: [&str; 5] = ["api_key", "authorization", "password", "secret", "token"];
const KEY_PREFIXES: [&str; 2] = ["sk-", "gsk_"];
const REDACTED: &str = "***REDACTED***";

/// `TIMESTAMP [span_id=N] LEVEL target: fields`, with secrets masked.
#[derive(Default)]
pub struct RedactingText {
    timer: SystemTime,
}

impl RedactingText {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn mask_key_tokens(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some((pos, prefix)) = KEY_PREFIXES
        .iter()
        .filter_map(|p| rest.find(p).map(|i| (i, *p)))
        .min_by_key(|(i, _)| *i)
    {
        let after = pos + prefix.len();
        let tail = &rest[after..];
        out.push_str(&rest[..after]);
        // "task-list" is not a key: the prefix must start a token.
        let starts_token = !rest[..pos].chars().next_back().is_some_and(is_key_char);
        if !starts_token {
            rest = tail;
            continue;
        }
        let token_len = tail.find(|c: char| !is_key_char(c)).unwrap_or(tail.len());
        if token_len > 0 {
            out.push_str("***");
        }
        rest = &tail[token_len..];
    }
    out.push_str(rest);
    out
}

/// Masks credential fields (`api_key=...`) and key-shaped tokens.
pub fn redact(fields: &str) -> String {
    let masked: Vec<String> = fields
        .split(' ')
        .map(|word| match word.split_once('=') {
            Some((name, _)) if SENSITIVE_FIELDS.contains(&name.to_ascii_lowercase().as_str()) => {
                format!("{}={}", name, REDACTED)
            }
            _ => word.to_string(),
        })
        .collect();
    mask_key_tokens(&masked.join(" "))
}

impl<S, N> FormatEvent<S, N> for RedactingText
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        self.timer.format_time(&mut writer)?;
        if let Some(span) = ctx.parent_span() {
            let root = span.scope().from_root().next().map(|s| s.id()).unwrap_or(span.id());
            write!(writer, " span_id={}", root.into_u64())?;
        }
        let meta = event.metadata();
        write!(writer, " {}: {}: ", meta.level(), meta.target())?;

        let mut fields = String::new();
        ctx.field_format()
            .format_fields(Writer::new(&mut fields), event)?;
        writeln!(writer, "{}", redact(&fields))
    }
}
