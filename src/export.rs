// src/export.rs
use log::info;
use plotters::prelude::*;
use printpdf::{ImageTransform, Mm, PdfDocument};
use std::fs;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::chart::{draw_frame, ChartSurface};
use crate::data_types::ExportFormat;
use crate::error::{Error, Result};

/// Raster exports are mapped at 96 pixels per inch.
const EXPORT_DPI: f64 = 96.0;

/// Serializes the surface to `directory/file_name.<format>`, creating the
/// directory when needed.
///
/// The bytes are written to a temporary file first and renamed into place,
/// so a failing export never leaves a corrupt file behind.
pub fn save(
    surface: &ChartSurface,
    directory: &Path,
    file_name: &str,
    format: ExportFormat,
) -> Result<PathBuf> {
    if directory.exists() {
        info!("Directory already exists: {}", directory.display());
    } else {
        fs::create_dir_all(directory).map_err(|err| {
            Error::Export(format!(
                "cannot create directory '{}': {err}",
                directory.display()
            ))
        })?;
        info!("Directory created: {}", directory.display());
    }

    let path = directory.join(format!("{file_name}.{}", format.extension()));
    let bytes = match format {
        ExportFormat::Png => encode_png(surface)?,
        ExportFormat::Svg => encode_svg(surface)?,
        ExportFormat::Pdf => encode_pdf(surface)?,
    };

    let mut staged = NamedTempFile::new_in(directory).map_err(|err| {
        Error::Export(format!(
            "cannot stage file in '{}': {err}",
            directory.display()
        ))
    })?;
    staged
        .write_all(&bytes)
        .map_err(|err| Error::Export(err.to_string()))?;
    staged.persist(&path).map_err(|err| {
        Error::Export(format!("cannot write '{}': {err}", path.display()))
    })?;

    info!("Plot saved to {}", path.display());
    Ok(path)
}

fn encode_png(surface: &ChartSurface) -> Result<Vec<u8>> {
    let raster =
        image::RgbImage::from_raw(surface.width(), surface.height(), surface.buffer().to_vec())
            .ok_or_else(|| {
                Error::Export("surface buffer does not match its dimensions".into())
            })?;
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(raster)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .map_err(|err| Error::Export(err.to_string()))?;
    Ok(bytes)
}

/// Re-draws the last rendered frame onto an SVG backend so the vector
/// export is not a rasterized copy.
fn encode_svg(surface: &ChartSurface) -> Result<Vec<u8>> {
    let scene = surface
        .scene()
        .ok_or_else(|| Error::Export("nothing has been rendered yet".into()))?;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (surface.width(), surface.height()))
            .into_drawing_area();
        draw_frame(&root, &scene.series, scene.graph_type, &scene.settings)?;
        root.present().map_err(|err| Error::Export(err.to_string()))?;
    }
    Ok(svg.into_bytes())
}

/// Embeds the rendered raster on a single PDF page sized to the surface.
fn encode_pdf(surface: &ChartSurface) -> Result<Vec<u8>> {
    let width_mm = surface.width() as f64 * 25.4 / EXPORT_DPI;
    let height_mm = surface.height() as f64 * 25.4 / EXPORT_DPI;
    let (doc, page, layer) =
        PdfDocument::new("chart", Mm(width_mm as f32), Mm(height_mm as f32), "chart");

    let raster = printpdf::image_crate::RgbImage::from_raw(
        surface.width(),
        surface.height(),
        surface.buffer().to_vec(),
    )
    .ok_or_else(|| Error::Export("surface buffer does not match its dimensions".into()))?;
    let embedded = printpdf::Image::from_dynamic_image(
        &printpdf::image_crate::DynamicImage::ImageRgb8(raster),
    );
    embedded.add_to_layer(
        doc.get_page(page).get_layer(layer),
        ImageTransform {
            dpi: Some(EXPORT_DPI as f32),
            ..Default::default()
        },
    );

    let mut bytes = Vec::new();
    doc.save(&mut BufWriter::new(&mut bytes))
        .map_err(|err| Error::Export(err.to_string()))?;
    Ok(bytes)
}
