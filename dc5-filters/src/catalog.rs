use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use crate::filter::{load_filters, FilterCatalog, RawFilterRow};

const COLUMN_ALIASES: [(&str, &str); 2] = [("fid", "id"), ("description", "name")];

/// En-têtes en minuscules ; un alias n'est renommé que si la colonne
/// canonique est absente.
fn normalize_headers(headers: &csv::StringRecord) -> csv::StringRecord {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    lowered
        .iter()
        .map(|h| {
            match COLUMN_ALIASES.iter().find(|(alias, _)| alias == h) {
                Some((_, canonical)) if !lowered.iter().any(|other| other == canonical) => {
                    canonical.to_string()
                }
                _ => h.clone(),
            }
        })
        .collect()
}

pub fn read_rows<R: Read>(input: R) -> Result<(Vec<RawFilterRow>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers = reader
        .headers()
        .context("Impossible de lire l'en-tête du catalogue")?
        .clone();
    reader.set_headers(normalize_headers(&headers));

    let mut rows = Vec::new();
    let mut unreadable = 0;
    for (i, record) in reader.deserialize::<RawFilterRow>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => {
                log::warn!("Ligne {} du catalogue illisible : {}", i + 1, e);
                unreadable += 1;
            }
        }
    }

    Ok((rows, unreadable))
}

pub fn parse_catalog<R: Read>(input: R) -> Result<FilterCatalog> {
    let (rows, unreadable) = read_rows(input)?;
    let mut catalog = load_filters(rows);
    catalog.report_mut().unreadable = unreadable;
    Ok(catalog)
}

pub fn read_catalog(path: &Path) -> Result<FilterCatalog> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Impossible d'ouvrir le catalogue {:?}", path))?;
    let catalog = parse_catalog(file)
        .with_context(|| format!("Catalogue invalide {:?}", path))?;

    let report = catalog.report();
    log::info!(
        "Catalogue {:?} : {} lignes, {} filtres, {} cassés, {} doublons",
        path,
        report.rows,
        report.loaded,
        report.broken,
        report.duplicates.len()
    );
    Ok(catalog)
}
