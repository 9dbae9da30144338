use seaguard_core::export::ExportFormat;
use seaguard_core::parse::SourceFormat;

pub(super) fn parse_source_format(raw: &str) -> std::result::Result<SourceFormat, String> {
    SourceFormat::parse(raw)
        .ok_or_else(|| format!("unknown format '{raw}', expected csv, json or geojson"))
}

pub(super) fn parse_export_format(raw: &str) -> std::result::Result<ExportFormat, String> {
    ExportFormat::parse(raw)
        .ok_or_else(|| format!("unknown export format '{raw}', expected json or csv"))
}

pub(super) fn parse_finite_f64(raw: &str) -> std::result::Result<f64, String> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid number '{raw}'"))?;
    if !value.is_finite() {
        return Err(format!("value must be finite, got {value}"));
    }
    Ok(value)
}

pub(super) fn parse_min_one_u64(raw: &str) -> std::result::Result<u64, String> {
    let value = raw
        .parse::<u64>()
        .map_err(|_| format!("invalid integer value '{raw}'"))?;
    if value == 0 {
        return Err("value must be >= 1".to_string());
    }
    Ok(value)
}
