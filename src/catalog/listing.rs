//! Listing title parsing
//!
//! Shop listings pack the whole hardware sheet into the product title, e.g.
//!
//! ```text
//! Lenovo LOQ 15IAX9 15.6" FHD IPS | i5-12450HX | RTX 2050 | 24GB Ram | 512GB NVMe | Windows 11 Home
//! ```
//!
//! The first `|`-separated segment carries brand, series, model and the screen; every
//! later segment is classified by the first rule that matches it.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use url::form_urlencoded;

lazy_static! {
    static ref SCREEN_SIZE: Regex = Regex::new(r#"(\d+\.?\d*)["']"#).unwrap();
    static ref SCREEN_INFO: Regex =
        Regex::new(r"(?i)(FHD|HD|QHD|4K|UHD)\s*(IPS|TN|VA|OLED)?").unwrap();
    static ref CPU: Regex = Regex::new(r"(?i)i\d-\d+[A-Z]*|Ryzen|AMD|Intel Core").unwrap();
    static ref GPU: Regex = Regex::new(r"(?i)RTX|GTX|Radeon|Intel (Iris|UHD|HD)").unwrap();
    static ref RAM: Regex = Regex::new(r"(?i)\d+\s*GB\s*(RAM)?").unwrap();
    static ref STORAGE: Regex = Regex::new(r"(?i)\d+\s*(GB|TB)\s*(SSD|NVMe|HDD)").unwrap();
    static ref OS: Regex = Regex::new(r"(?i)Windows").unwrap();
}

/// Attributes recovered from a listing title
///
/// Fields the title does not mention are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingSpecs {
    pub brand: String,
    pub series: String,
    pub model: String,
    /// Diagonal with an inch mark, e.g. `15.6"`
    pub screen_size: String,
    pub screen_resolution: String,
    pub screen_type: String,
    pub cpu: String,
    pub gpu: String,
    pub ram: String,
    pub storage: String,
    pub os: String,
}

/// Split a listing title into its hardware fields
///
/// When two segments fall into the same category the later one wins.
pub fn parse_listing_title(title: &str) -> ListingSpecs {
    let mut specs = ListingSpecs::default();
    let mut parts = title.split('|');

    if let Some(head) = parts.next() {
        parse_head(head.trim(), &mut specs);
    }

    for part in parts.map(str::trim) {
        let upper = part.to_uppercase();
        let slot = if CPU.is_match(part) {
            &mut specs.cpu
        } else if GPU.is_match(part) {
            &mut specs.gpu
        } else if RAM.is_match(part) && !upper.contains("SSD") && !upper.contains("NVME") {
            &mut specs.ram
        } else if STORAGE.is_match(part) {
            &mut specs.storage
        } else if OS.is_match(part) {
            &mut specs.os
        } else {
            continue;
        };
        *slot = part.to_string();
    }

    specs
}

fn parse_head(head: &str, specs: &mut ListingSpecs) {
    // Identity words are everything before the screen size
    let mut identity = head;
    if let Some(caps) = SCREEN_SIZE.captures(head) {
        specs.screen_size = format!("{}\"", &caps[1]);
        if let Some(m) = caps.get(0) {
            identity = &head[..m.start()];
        }
    }

    if let Some(caps) = SCREEN_INFO.captures(head) {
        specs.screen_resolution = caps[1].to_string();
        specs.screen_type = caps.get(2).map_or("", |m| m.as_str()).to_string();
    }

    let mut words = identity.split_whitespace();
    if let Some(brand) = words.next() {
        specs.brand = brand.to_string();
    }
    if let Some(series) = words.next() {
        specs.series = series.to_string();
    }
    specs.model = words.collect::<Vec<_>>().join(" ");
}

/// Recover the original image address from an image-optimizer URL
///
/// Optimizer URLs look like `/_next/image?url=https%3A%2F%2F...&w=640`; the decoded
/// `url` parameter is returned. Anything else comes back unchanged.
pub fn unwrap_image_url(src: &str) -> String {
    let query = match src.split_once('?') {
        Some((_, query)) => query.split('#').next().unwrap_or(query),
        None => return src.to_string(),
    };

    form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == "url" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| src.to_string())
}
