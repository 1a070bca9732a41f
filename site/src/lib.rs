//! Static HTML rendering of a [`RelaySet`].
//!
//! Output layout under `output_root`:
//!
//! ```text
//! index.html                          top relays by bandwidth
//! misc/all.html                       every relay
//! misc/families-by-<sort>.html        family buckets
//! misc/networks-by-<sort>.html        AS buckets
//! <category>/<key>/index.html         one page per bucket
//! relay/<fingerprint>.html            one page per relay
//! static/                             copied once from `static_dir`
//! ```
//!
//! Everything is read through the relay set's query surface; nothing here
//! changes the index.

pub mod config;
pub mod countries;
pub mod html;
pub mod listing;

use config::SiteConfig;
use listing::{SortKey, sorted_rows};
use relays::{Bucket, Category, Relay, RelaySet};
use std::collections::HashSet;
use std::fmt::{self, Write};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(thiserror::Error, Debug)]
pub enum SiteError {
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("could not format page: {0}")]
    Format(#[from] fmt::Error),
    #[error(transparent)]
    Query(#[from] relays::QueryError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SiteError + '_ {
    move |source| SiteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SiteStats {
    pub pages: usize,
}

/// Writes the complete site for `set`.
pub fn write_site(set: &RelaySet, config: &SiteConfig) -> Result<SiteStats, SiteError> {
    let mut site = Site {
        set,
        config,
        stats: SiteStats::default(),
    };

    fs::create_dir_all(&config.output_root).map_err(io_error(&config.output_root))?;

    site.write_index()?;
    site.write_all()?;
    for sort in SortKey::ALL {
        site.write_families(sort)?;
        site.write_networks(sort)?;
    }
    for category in Category::ALL {
        site.write_pages_by_key(category)?;
    }
    site.write_relay_info()?;
    site.copy_static()?;

    tracing::info!(
        pages = site.stats.pages,
        output_root = ?config.output_root,
        "Wrote site"
    );
    Ok(site.stats)
}

struct Site<'a> {
    set: &'a RelaySet,
    config: &'a SiteConfig,
    stats: SiteStats,
}

impl Site<'_> {
    fn write_page(&mut self, relative: &Path, page: &str) -> Result<(), SiteError> {
        let path = self.config.output_root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(&path, page).map_err(io_error(&path))?;
        self.stats.pages += 1;
        Ok(())
    }

    /// Removes and recreates `<output_root>/<name>` so no stale pages survive.
    fn reset_dir(&self, name: &str) -> Result<PathBuf, SiteError> {
        let path = self.config.output_root.join(name);
        match fs::remove_dir_all(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(io_error(&path)(err)),
        }
        fs::create_dir_all(&path).map_err(io_error(&path))?;
        Ok(path)
    }

    fn write_index(&mut self) -> Result<(), SiteError> {
        let relays = self.set.relays();
        let top = &relays[..relays.len().min(self.config.index_limit)];
        let title = format!("Top {} relays by bandwidth", top.len());
        let page = self.listing_page("./", &title, top)?;
        self.write_page(Path::new("index.html"), &page)
    }

    fn write_all(&mut self) -> Result<(), SiteError> {
        let page = self.listing_page("../", "All relays", self.set.relays())?;
        self.write_page(Path::new("misc/all.html"), &page)
    }

    fn listing_page(&self, prefix: &str, title: &str, relays: &[Relay]) -> Result<String, SiteError> {
        let (bandwidth, exits) = relays.iter().fold((0_u128, 0), |(bw, exits), relay| {
            (
                bw + u128::from(relay.observed_bandwidth),
                exits + usize::from(relay.is_exit()),
            )
        });

        let mut out = String::new();
        html::header(&mut out, prefix, title, self.set.relays_published())?;
        html::summary(&mut out, bandwidth, exits, relays.len() - exits)?;
        html::relay_table(&mut out, prefix, relays)?;
        html::footer(&mut out)?;
        Ok(out)
    }

    fn write_families(&mut self, sort: SortKey) -> Result<(), SiteError> {
        let prefix = "../";
        let rows = sorted_rows(self.set, Category::Family, sort);
        let mut out = String::new();
        let title = format!("Families by {}", sort.label());
        html::header(&mut out, prefix, &title, self.set.relays_published())?;
        sort_links(&mut out, "families")?;

        writeln!(
            out,
            "<table>\n<tr><th>Family</th><th>Relays</th><th>MB/s</th><th>Exit</th><th>Middle</th><th>Contact</th><th>Oldest First Seen</th></tr>"
        )?;
        for row in &rows {
            out.write_str("<tr><td>")?;
            html::bucket_link(&mut out, prefix, Category::Family, row.key, row.key)?;
            bucket_cells(&mut out, row.bucket)?;
            out.write_str("<td>")?;
            if let Some(family) = row.bucket.family() {
                html::bucket_link(
                    &mut out,
                    prefix,
                    Category::Contact,
                    &family.contact_md5,
                    family.contact.as_deref().unwrap_or("none"),
                )?;
            }
            writeln!(
                out,
                "</td><td>{}</td></tr>",
                html::escape(row.first_seen.unwrap_or_default())
            )?;
        }
        writeln!(out, "</table>")?;
        html::footer(&mut out)?;

        self.write_page(&Path::new("misc").join(format!("families-{}.html", sort.slug())), &out)
    }

    fn write_networks(&mut self, sort: SortKey) -> Result<(), SiteError> {
        let prefix = "../";
        let rows = sorted_rows(self.set, Category::As, sort);
        let mut out = String::new();
        let title = format!("Networks by {}", sort.label());
        html::header(&mut out, prefix, &title, self.set.relays_published())?;
        sort_links(&mut out, "networks")?;

        writeln!(
            out,
            "<table>\n<tr><th>AS</th><th>Relays</th><th>MB/s</th><th>Exit</th><th>Middle</th><th>AS Name</th><th>Country</th><th>Oldest First Seen</th></tr>"
        )?;
        for row in &rows {
            out.write_str("<tr><td>")?;
            html::bucket_link(&mut out, prefix, Category::As, row.key, row.key)?;
            bucket_cells(&mut out, row.bucket)?;
            out.write_str("<td>")?;
            if let Some(network) = row.bucket.network() {
                out.write_str(&html::escape(network.as_name.as_deref().unwrap_or_default()))?;
                out.write_str("</td><td>")?;
                if let Some(country) = &network.country {
                    let name = network.country_name.as_deref().unwrap_or(country);
                    html::bucket_link(&mut out, prefix, Category::Country, country, name)?;
                }
            } else {
                out.write_str("</td><td>")?;
            }
            writeln!(
                out,
                "</td><td>{}</td></tr>",
                html::escape(row.first_seen.unwrap_or_default())
            )?;
        }
        writeln!(out, "</table>")?;
        html::footer(&mut out)?;

        self.write_page(&Path::new("misc").join(format!("networks-{}.html", sort.slug())), &out)
    }

    /// One page per bucket of `category`.
    fn write_pages_by_key(&mut self, category: Category) -> Result<(), SiteError> {
        self.reset_dir(category.as_str())?;

        let set = self.set;
        let Ok(keys) = set.index().bucket_keys(category) else {
            tracing::debug!(%category, "No buckets");
            return Ok(());
        };

        // Flag keys are lower-cased on disk, so two keys can map to one
        // directory. The first key in canonical order keeps it.
        let mut written = HashSet::new();
        for key in keys {
            let dir = html::bucket_dir(category, key);
            if !written.insert(dir.clone()) {
                tracing::warn!(%category, %key, %dir, "Bucket directory already written, skipping");
                continue;
            }

            let bucket = set.index().bucket(category, key)?;
            let members = set.resolve_members(category, key)?;
            let page = bucket_page(set, category, key, bucket, &members)?;
            let relative = Path::new(category.as_str()).join(dir.as_ref()).join("index.html");
            self.write_page(&relative, &page)?;
        }
        Ok(())
    }

    fn write_relay_info(&mut self) -> Result<(), SiteError> {
        self.reset_dir("relay")?;

        let set = self.set;
        for relay in set.relays() {
            if !html::is_relay_page(&relay.fingerprint) {
                tracing::debug!(fingerprint = %relay.fingerprint, "Skipping relay page");
                continue;
            }
            let page = relay_page(set, relay)?;
            let relative = Path::new("relay").join(format!("{}.html", relay.fingerprint));
            self.write_page(&relative, &page)?;
        }
        Ok(())
    }

    fn copy_static(&self) -> Result<(), SiteError> {
        let dest = self.config.output_root.join("static");
        if dest.exists() {
            return Ok(());
        }
        if !self.config.static_dir.is_dir() {
            tracing::warn!(static_dir = ?self.config.static_dir, "Static directory not found, not copying");
            return Ok(());
        }
        copy_dir(&self.config.static_dir, &dest)
    }
}

fn sort_links(out: &mut String, page: &str) -> fmt::Result {
    out.write_str("<p>sort by:")?;
    for sort in SortKey::ALL {
        write!(
            out,
            r#" <a href="{page}-{slug}.html">{label}</a>"#,
            slug = sort.slug(),
            label = sort.label()
        )?;
    }
    writeln!(out, "</p>")
}

fn bucket_cells(out: &mut String, bucket: &Bucket) -> fmt::Result {
    write!(
        out,
        "</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
        bucket.len(),
        html::format_bandwidth(bucket.bandwidth()),
        bucket.exit_count(),
        bucket.middle_count()
    )
}

fn bucket_title(category: Category, key: &str, bucket: &Bucket, members: &[&Relay]) -> String {
    let first = members.first();
    match category {
        Category::As => match bucket.network().and_then(|n| n.as_name.as_deref()) {
            Some(as_name) => format!("Relays in {key} ({as_name})"),
            None => format!("Relays in {key}"),
        },
        Category::Contact => {
            match first.and_then(|relay| relay.contact.as_deref()) {
                Some(contact) => format!("Relays with contact {contact}"),
                None => "Relays without contact".to_string(),
            }
        }
        Category::Country => {
            let name = first
                .and_then(|relay| relay.country_name.as_deref())
                .unwrap_or(key);
            format!("Relays in {}", countries::in_sentence(name))
        }
        Category::Family => format!("Family of {key}"),
        Category::Flag => format!("Relays with the {key} flag"),
        Category::Platform => format!("Relays running {key}"),
        Category::FirstSeen => format!("Relays first seen on {key}"),
    }
}

fn bucket_page(
    set: &RelaySet,
    category: Category,
    key: &str,
    bucket: &Bucket,
    members: &[&Relay],
) -> Result<String, SiteError> {
    let prefix = "../../";
    let title = bucket_title(category, key, bucket, members);

    let mut out = String::new();
    html::header(&mut out, prefix, &title, set.relays_published())?;
    html::summary(&mut out, bucket.bandwidth(), bucket.exit_count(), bucket.middle_count())?;

    if let Some(family) = bucket.family() {
        out.write_str(r#"<p class="family">contact: "#)?;
        html::bucket_link(
            &mut out,
            prefix,
            Category::Contact,
            &family.contact_md5,
            family.contact.as_deref().unwrap_or("none"),
        )?;
        writeln!(out, ", oldest relay first seen {}</p>", html::escape(&family.first_seen))?;
    }

    html::relay_table(&mut out, prefix, members.iter().copied())?;
    html::footer(&mut out)?;
    Ok(out)
}

fn relay_page(set: &RelaySet, relay: &Relay) -> Result<String, SiteError> {
    let prefix = "../";
    let title = format!("{} ({})", html::nickname(relay), relay.fingerprint);

    let mut out = String::new();
    html::header(&mut out, prefix, &title, set.relays_published())?;
    writeln!(out, "<dl>")?;

    writeln!(out, "<dt>Fingerprint</dt><dd>{}</dd>", html::escape(&relay.fingerprint))?;
    writeln!(
        out,
        "<dt>Observed Bandwidth</dt><dd>{} MB/s</dd>",
        html::format_bandwidth(u128::from(relay.observed_bandwidth))
    )?;
    writeln!(out, "<dt>Consensus Weight</dt><dd>{}</dd>", relay.consensus_weight)?;
    writeln!(out, "<dt>Running</dt><dd>{}</dd>", relay.running)?;

    out.write_str("<dt>OR Addresses</dt><dd>")?;
    for address in &relay.or_addresses {
        write!(out, "{}<br>", html::escape(address))?;
    }
    writeln!(out, "</dd>")?;

    out.write_str("<dt>Flags</dt><dd>")?;
    for flag in &relay.flags {
        html::bucket_link(&mut out, prefix, Category::Flag, flag, flag)?;
        out.write_str(" ")?;
    }
    writeln!(out, "</dd>")?;

    out.write_str("<dt>AS</dt><dd>")?;
    if let Some(as_number) = &relay.as_number {
        html::bucket_link(&mut out, prefix, Category::As, as_number, as_number)?;
        if let Some(as_name) = &relay.as_name {
            write!(out, " ({})", html::escape(as_name))?;
        }
    }
    writeln!(out, "</dd>")?;

    out.write_str("<dt>Country</dt><dd>")?;
    if let Some(country) = &relay.country {
        let name = relay.country_name.as_deref().unwrap_or(country);
        html::bucket_link(&mut out, prefix, Category::Country, country, name)?;
    }
    writeln!(out, "</dd>")?;

    out.write_str("<dt>Platform</dt><dd>")?;
    if let Some(platform) = &relay.platform {
        html::bucket_link(&mut out, prefix, Category::Platform, platform, platform)?;
    }
    writeln!(out, "</dd>")?;

    out.write_str("<dt>Contact</dt><dd>")?;
    html::bucket_link(
        &mut out,
        prefix,
        Category::Contact,
        &relay.contact_md5,
        relay.contact.as_deref().unwrap_or("none"),
    )?;
    writeln!(out, "</dd>")?;

    out.write_str("<dt>First Seen</dt><dd>")?;
    let date = relay.first_seen_date();
    html::bucket_link(&mut out, prefix, Category::FirstSeen, date, &relay.first_seen)?;
    writeln!(out, "</dd>")?;
    writeln!(
        out,
        "<dt>Last Seen</dt><dd>{}</dd>",
        html::escape(relay.last_seen.as_deref().unwrap_or_default())
    )?;

    out.write_str("<dt>Effective Family</dt><dd>")?;
    if relay.has_family() {
        for member in &relay.effective_family {
            html::relay_link(&mut out, prefix, member, member)?;
            out.write_str("<br>")?;
        }
    }
    writeln!(out, "</dd>")?;

    writeln!(out, "</dl>")?;
    html::footer(&mut out)?;
    Ok(out)
}

fn copy_dir(src: &Path, dest: &Path) -> Result<(), SiteError> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|err| SiteError::Io {
            path: err.path().unwrap_or(src).to_path_buf(),
            source: err.into(),
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let to = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&to).map_err(io_error(&to))?;
        } else {
            fs::copy(entry.path(), &to).map_err(io_error(entry.path()))?;
        }
    }
    Ok(())
}
