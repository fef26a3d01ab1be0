// SPDX-FileCopyrightText: 2025 Joost van der Laan
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use chrono::Local;
use csv::Writer;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::RatesPayload;

/// Export a rates payload to a timestamped CSV under `output_dir`.
pub fn export_rates_csv(payload: &RatesPayload, output_dir: &Path) -> Result<PathBuf> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir)?;
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let csv_path = output_dir.join(format!(
        "rates_{}_{}.csv",
        payload.base.to_lowercase(),
        timestamp
    ));
    let mut writer = Writer::from_path(&csv_path)?;

    writer.write_record(["Base", "Code", "Description", "Rate", "Date"])?;

    let mut codes: Vec<&String> = payload.rates.keys().collect();
    codes.sort();

    for code in codes {
        let description = payload
            .symbols
            .get(code)
            .map(|s| s.description.as_str())
            .unwrap_or("");
        writer.write_record([
            payload.base.as_str(),
            code,
            description,
            &payload.rates[code].to_string(),
            payload.date.as_deref().unwrap_or(""),
        ])?;
    }

    writer.flush()?;
    Ok(csv_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SymbolInfo;
    use std::collections::HashMap;

    #[test]
    fn test_export_writes_sorted_rows() -> Result<()> {
        let payload = RatesPayload {
            base: "USD".to_string(),
            date: Some("2024-01-01".to_string()),
            rates: HashMap::from([
                ("GBP".to_string(), 0.8),
                ("EUR".to_string(), 0.9),
            ]),
            symbols: HashMap::from([(
                "EUR".to_string(),
                SymbolInfo {
                    code: "EUR".to_string(),
                    description: "Euro".to_string(),
                },
            )]),
            last_updated: 1_700_000_000_000,
        };

        let dir = tempfile::tempdir()?;
        let path = export_rates_csv(&payload, dir.path())?;

        let contents = fs::read_to_string(&path)?;
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("Base,Code,Description,Rate,Date"));
        assert_eq!(lines.next(), Some("USD,EUR,Euro,0.9,2024-01-01"));
        assert_eq!(lines.next(), Some("USD,GBP,,0.8,2024-01-01"));
        Ok(())
    }
}
