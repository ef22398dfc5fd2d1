//! Catalogue scraping support
//!
//! The browser that walks the shop's listing pages lives outside this crate; it
//! captures one raw card per product (title, price text, image and link). This module
//! turns those cards into catalogue rows:
//!
//! - [`read_listing_cards`] reads the captured cards
//! - [`ScrapedProduct::from_card`] parses the title and unwraps the image URL
//! - [`ScrapedProduct::resolve_links`] makes relative links absolute against the
//!   configured listing page
//! - [`write_catalog`] writes the catalogue file
//!
//! The written file is the starting point of the product dataset; pricing and stock
//! columns are filled in before the server loads it.

pub mod listing;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
pub use listing::{parse_listing_title, unwrap_image_url, ListingSpecs};

/// Columns of the catalogue file, in order
pub const CATALOG_COLUMNS: &[&str] = &[
    "product_name",
    "brand",
    "series",
    "model",
    "screen_size",
    "screen_resolution",
    "screen_type",
    "cpu",
    "gpu",
    "ram",
    "storage",
    "os",
    "price",
    "image_url",
    "product_url",
];

/// One product card as captured from a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListingCard {
    #[serde(default)]
    pub product_name: String,
    /// Price text as displayed, `"N/A"` when the card had none
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub product_url: String,
}

/// One catalogue row
///
/// Field order matches [`CATALOG_COLUMNS`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedProduct {
    pub product_name: String,
    pub brand: String,
    pub series: String,
    pub model: String,
    pub screen_size: String,
    pub screen_resolution: String,
    pub screen_type: String,
    pub cpu: String,
    pub gpu: String,
    pub ram: String,
    pub storage: String,
    pub os: String,
    pub price: String,
    pub image_url: String,
    pub product_url: String,
}

impl ScrapedProduct {
    /// Build a catalogue row from a captured card
    pub fn from_card(card: ListingCard) -> Self {
        let product_name = card.product_name.trim().to_string();
        let specs = parse_listing_title(&product_name);
        let price = match card.price.trim() {
            "" => "N/A".to_string(),
            p => p.to_string(),
        };

        Self {
            brand: specs.brand,
            series: specs.series,
            model: specs.model,
            screen_size: specs.screen_size,
            screen_resolution: specs.screen_resolution,
            screen_type: specs.screen_type,
            cpu: specs.cpu,
            gpu: specs.gpu,
            ram: specs.ram,
            storage: specs.storage,
            os: specs.os,
            price,
            image_url: unwrap_image_url(card.image_url.trim()),
            product_url: card.product_url.trim().to_string(),
            product_name,
        }
    }

    /// Resolve relative image and product links against the listing page
    pub fn resolve_links(mut self, base: &Url) -> Self {
        self.image_url = resolve_link(base, &self.image_url);
        self.product_url = resolve_link(base, &self.product_url);
        self
    }
}

fn resolve_link(base: &Url, href: &str) -> String {
    if href.is_empty() || Url::parse(href).is_ok() {
        return href.to_string();
    }
    match base.join(href) {
        Ok(url) => url.into(),
        Err(e) => {
            debug!(href, error = %e, "Keeping unresolvable link as captured");
            href.to_string()
        }
    }
}

/// Read captured cards, skipping those without a title
pub fn read_listing_cards(path: impl AsRef<Path>) -> Result<Vec<ListingCard>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let mut cards = Vec::new();
    for (idx, record) in reader.deserialize::<ListingCard>().enumerate() {
        let card = record?;
        if card.product_name.trim().is_empty() {
            debug!(row = idx + 1, "Skipping listing card without a title");
            continue;
        }
        cards.push(card);
    }
    Ok(cards)
}

/// Write catalogue rows with a header; returns the number of rows written
///
/// An empty slice is rejected rather than producing a header-only file.
pub fn write_catalog(path: impl AsRef<Path>, products: &[ScrapedProduct]) -> Result<usize> {
    if products.is_empty() {
        return Err(Error::invalid_argument("no products to write"));
    }

    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    for product in products {
        writer.serialize(product)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = products.len(), "Catalogue written");
    Ok(products.len())
}

/// Parse every card in `input` and write the catalogue to `output`
pub fn convert_listings(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    listing_base: &Url,
) -> Result<usize> {
    let products: Vec<ScrapedProduct> = read_listing_cards(input)?
        .into_iter()
        .map(|card| ScrapedProduct::from_card(card).resolve_links(listing_base))
        .collect();
    write_catalog(output, &products)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_card() {
        let product = ScrapedProduct::from_card(ListingCard {
            product_name: " MSI Katana 15 B13VFK 15.6\" FHD | i7-13620H | RTX 4060 ".to_string(),
            price: String::new(),
            image_url: "/_next/image?url=https%3A%2F%2Fcdn.example.com%2Fkatana.png&w=640"
                .to_string(),
            product_url: "https://megapc.tn/shop/product/katana".to_string(),
        });
        assert_eq!(product.product_name, "MSI Katana 15 B13VFK 15.6\" FHD | i7-13620H | RTX 4060");
        assert_eq!(product.brand, "MSI");
        assert_eq!(product.model, "15 B13VFK");
        assert_eq!(product.gpu, "RTX 4060");
        assert_eq!(product.price, "N/A");
        assert_eq!(product.image_url, "https://cdn.example.com/katana.png");
    }

    #[test]
    fn test_write_catalog_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        let rows = vec![ScrapedProduct {
            product_name: "Dell G15".to_string(),
            brand: "Dell".to_string(),
            price: "3 299,000 DT".to_string(),
            ..Default::default()
        }];

        assert_eq!(write_catalog(&path, &rows).unwrap(), 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(header, CATALOG_COLUMNS.join(","));
        assert!(contents.contains("\"3 299,000 DT\""));
    }

    #[test]
    fn test_write_catalog_rejects_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_catalog(dir.path().join("empty.csv"), &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(!dir.path().join("empty.csv").exists());
    }

    #[test]
    fn test_convert_listings_skips_blank_titles() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cards.csv");
        let output = dir.path().join("catalog.csv");
        std::fs::write(
            &input,
            "product_name,price,image_url,product_url\n\
             \"Lenovo LOQ 15IAX9 15.6\"\" FHD IPS | i5-12450HX\",2 499 DT,,/shop/product/loq\n\
             ,1 000 DT,,\n",
        )
        .unwrap();

        let base = Url::parse("https://megapc.tn/shop/PC%20PORTABLE").unwrap();
        assert_eq!(convert_listings(&input, &output, &base).unwrap(), 1);

        let mut reader = csv::Reader::from_path(&output).unwrap();
        let rows: Vec<ScrapedProduct> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].series, "LOQ");
        assert_eq!(rows[0].cpu, "i5-12450HX");
        assert_eq!(rows[0].screen_type, "IPS");
        assert_eq!(rows[0].product_url, "https://megapc.tn/shop/product/loq");
    }

    #[test]
    fn test_resolve_links() {
        let base = Url::parse("https://megapc.tn/shop/PC%20PORTABLE/PC%20PORTABLE%20GAMER").unwrap();
        let product = ScrapedProduct {
            image_url: "/_next/static/media/placeholder.png".to_string(),
            product_url: "https://megapc.tn/shop/product/katana".to_string(),
            ..Default::default()
        }
        .resolve_links(&base);
        assert_eq!(
            product.image_url,
            "https://megapc.tn/_next/static/media/placeholder.png"
        );
        assert_eq!(product.product_url, "https://megapc.tn/shop/product/katana");

        let empty = ScrapedProduct::default().resolve_links(&base);
        assert_eq!(empty.image_url, "");
        assert_eq!(empty.product_url, "");
    }
}
