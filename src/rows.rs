use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::product::NormalizedProduct;

/// One line of the Shopify import table. A product with k images becomes k
/// rows sharing a Handle; only the first row carries the product-level
/// fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Handle")]
    pub handle: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Body (HTML)")]
    pub body_html: String,
    #[serde(rename = "Vendor")]
    pub vendor: String,
    #[serde(rename = "Type")]
    pub product_type: String,
    #[serde(rename = "Tags")]
    pub tags: String,
    #[serde(rename = "Published")]
    pub published: String,
    #[serde(rename = "Option1 Name")]
    pub option1_name: String,
    #[serde(rename = "Option1 Value")]
    pub option1_value: String,
    #[serde(rename = "Variant Price")]
    pub variant_price: String,
    #[serde(rename = "Variant Compare At Price")]
    pub variant_compare_at_price: String,
    #[serde(rename = "Image Src")]
    pub image_src: String,
    #[serde(rename = "Image Position")]
    pub image_position: usize,
}

/// Product-level labels supplied by configuration, not scraped.
#[derive(Debug, Clone)]
pub struct ExportLabels {
    pub vendor: String,
    pub product_type: String,
    pub tags: String,
}

/// Explode one normalized product into one row per image.
pub fn build_rows(product: &NormalizedProduct, labels: &ExportLabels) -> Vec<ExportRow> {
    product
        .images
        .iter()
        .enumerate()
        .map(|(index, image)| {
            let first = index == 0;
            let field = |v: &str| if first { v.to_string() } else { String::new() };
            ExportRow {
                handle: product.handle.clone(),
                title: field(&product.title),
                body_html: field(&product.description),
                vendor: field(&labels.vendor),
                product_type: field(&labels.product_type),
                tags: field(&labels.tags),
                published: "TRUE".to_string(),
                option1_name: "Title".to_string(),
                option1_value: "Default Title".to_string(),
                variant_price: field(&product.price),
                variant_compare_at_price: field(&product.compare_at_price),
                image_src: image.clone(),
                image_position: index + 1,
            }
        })
        .collect()
}

pub fn write_csv<W: Write>(writer: W, rows: &[ExportRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, rows: &[ExportRow]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(file, rows).with_context(|| format!("writing {}", path.display()))
}

// ── Tests ──
