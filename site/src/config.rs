use serde::Deserialize;
use std::path::PathBuf;

fn default_output_root() -> PathBuf {
    PathBuf::from("www")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_index_limit() -> usize {
    500
}

/// Output layout of the generated site.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SiteConfig {
    /// Directory the site is written to, created if missing
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    /// Static assets copied to `<output_root>/static` on the first run
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Number of relays listed on the front page
    #[serde(default = "default_index_limit")]
    pub index_limit: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            output_root: default_output_root(),
            static_dir: default_static_dir(),
            index_limit: default_index_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: SiteConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.index_limit, 500);
    }

    #[test]
    fn test_parse() {
        let config: SiteConfig =
            serde_yaml::from_str("output_root: /srv/www\nindex_limit: 100\n").unwrap();
        assert_eq!(config.output_root, PathBuf::from("/srv/www"));
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.index_limit, 100);
    }
}
