//! HTML building blocks shared by all pages.

use relays::{Category, Relay, is_valid_key};
use std::borrow::Cow;
use std::fmt::{self, Write};

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Bytes per second as MB/s with two decimals.
pub fn format_bandwidth(bandwidth: u128) -> String {
    format!("{:.2}", bandwidth as f64 / 1_000_000.0)
}

/// Directory name of a bucket page. Flags are the only keys that are case
/// folded.
pub fn bucket_dir(category: Category, key: &str) -> Cow<'_, str> {
    match category {
        Category::Flag => Cow::Owned(key.to_lowercase()),
        _ => Cow::Borrowed(key),
    }
}

/// Link to a bucket page, or the bare escaped text if `key` is not a usable
/// key.
pub fn bucket_link(
    out: &mut String,
    prefix: &str,
    category: Category,
    key: &str,
    text: &str,
) -> fmt::Result {
    if is_valid_key(key) {
        write!(
            out,
            r#"<a href="{prefix}{category}/{dir}/">{text}</a>"#,
            dir = bucket_dir(category, key),
            text = escape(text),
        )
    } else {
        out.write_str(&escape(text))
    }
}

pub fn relay_link(out: &mut String, prefix: &str, fingerprint: &str, text: &str) -> fmt::Result {
    if is_relay_page(fingerprint) {
        write!(
            out,
            r#"<a href="{prefix}relay/{fingerprint}.html">{text}</a>"#,
            text = escape(text),
        )
    } else {
        out.write_str(&escape(text))
    }
}

/// Relay pages are only written for plain alphanumeric fingerprints.
pub fn is_relay_page(fingerprint: &str) -> bool {
    !fingerprint.is_empty() && fingerprint.bytes().all(|b| b.is_ascii_alphanumeric())
}

pub fn header(out: &mut String, prefix: &str, title: &str, published: Option<&str>) -> fmt::Result {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, r#"<html lang="en">"#)?;
    writeln!(out, "<head>")?;
    writeln!(out, r#"<meta charset="utf-8">"#)?;
    writeln!(out, "<title>{} | allium</title>", escape(title))?;
    writeln!(
        out,
        r#"<link rel="stylesheet" href="{prefix}static/css/style.css">"#
    )?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(
        out,
        r#"<nav><a href="{prefix}index.html">allium</a> | <a href="{prefix}misc/all.html">all relays</a> | <a href="{prefix}misc/families-by-bandwidth.html">families</a> | <a href="{prefix}misc/networks-by-bandwidth.html">networks</a></nav>"#
    )?;
    if let Some(published) = published {
        writeln!(
            out,
            r#"<p class="published">relays published {}</p>"#,
            escape(published)
        )?;
    }
    writeln!(out, "<h2>{}</h2>", escape(title))
}

pub fn footer(out: &mut String) -> fmt::Result {
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

/// Bandwidth and exit/middle summary of a bucket or listing.
pub fn summary(
    out: &mut String,
    bandwidth: u128,
    exit_count: usize,
    middle_count: usize,
) -> fmt::Result {
    writeln!(
        out,
        r#"<p class="summary">{} MB/s, {exit_count} exit / {middle_count} middle relays</p>"#,
        format_bandwidth(bandwidth)
    )
}

/// A table with one row per relay, in the order given.
pub fn relay_table<'a>(
    out: &mut String,
    prefix: &str,
    rows: impl IntoIterator<Item = &'a Relay>,
) -> fmt::Result {
    writeln!(out, "<table>")?;
    writeln!(
        out,
        "<tr><th>Nickname</th><th>MB/s</th><th>OR Address</th><th>Flags</th><th>AS</th><th>Country</th><th>Platform</th><th>First Seen</th><th>Contact</th></tr>"
    )?;

    for relay in rows {
        out.write_str("<tr><td>")?;
        relay_link(out, prefix, &relay.fingerprint, nickname(relay))?;
        write!(
            out,
            "</td><td>{}</td><td>",
            format_bandwidth(u128::from(relay.observed_bandwidth))
        )?;
        out.write_str(&escape(
            relay.or_addresses.first().map(String::as_str).unwrap_or_default(),
        ))?;
        out.write_str("</td><td>")?;
        for (i, flag) in relay.flags.iter().enumerate() {
            if i > 0 {
                out.write_str(" ")?;
            }
            bucket_link(out, prefix, Category::Flag, flag, flag)?;
        }
        out.write_str("</td><td>")?;
        if let Some(as_number) = &relay.as_number {
            bucket_link(out, prefix, Category::As, as_number, as_number)?;
        }
        out.write_str("</td><td>")?;
        if let Some(country) = &relay.country {
            bucket_link(out, prefix, Category::Country, country, country)?;
        }
        out.write_str("</td><td>")?;
        if let Some(platform) = &relay.platform {
            bucket_link(out, prefix, Category::Platform, platform, platform)?;
        }
        out.write_str("</td><td>")?;
        let date = relay.first_seen_date();
        bucket_link(out, prefix, Category::FirstSeen, date, date)?;
        out.write_str("</td><td>")?;
        bucket_link(
            out,
            prefix,
            Category::Contact,
            &relay.contact_md5,
            relay.contact.as_deref().unwrap_or("none"),
        )?;
        writeln!(out, "</td></tr>")?;
    }

    writeln!(out, "</table>")
}

pub fn nickname(relay: &Relay) -> &str {
    if relay.nickname.is_empty() {
        "Unnamed"
    } else {
        &relay.nickname
    }
}
