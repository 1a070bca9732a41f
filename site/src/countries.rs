//! Country names that read as "the United States", not "United States".

const THE_PREFIXED: &[&str] = &[
    "Dominican Republic",
    "Ivory Coast",
    "Marshall Islands",
    "Northern Marianas Islands",
    "Solomon Islands",
    "United Arab Emirates",
    "United Kingdom",
    "United States",
    "United States of America",
    "Vatican City",
    "Czech Republic",
    "Bahamas",
    "Gambia",
    "Netherlands",
    "Philippines",
    "Seychelles",
    "Sudan",
    "Ukraine",
];

/// The country name as it appears in running text.
pub fn in_sentence(country_name: &str) -> String {
    if THE_PREFIXED.contains(&country_name) {
        format!("the {country_name}")
    } else {
        country_name.to_string()
    }
}
