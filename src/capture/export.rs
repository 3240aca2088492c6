//! CSV export of traces and region tables.
use crate::capture::error::Result;
use crate::capture::regions::RegionMetrics;
use serde::Serialize;
use std::io::Write;
/// One trace with its label track, as written by [`write_signal_csv`].
#[derive(Clone, Copy, Debug)]
pub struct SignalTable<'a> {
    /// Header of the value column, e.g. `signal` or `smoothed_signal`.
    pub column: &'a str,
    pub samples: &'a [f64],
    /// Missing trailing labels read as 0.
    pub labels: &'a [u8],
    /// Skip unlabelled samples.
    pub labelled_only: bool,
    /// Written as a leading `# METADATA: ` comment line.
    pub metadata: Option<&'a str>,
}
impl<'a> SignalTable<'a> {
    pub fn new(samples: &'a [f64], labels: &'a [u8]) -> Self {
        Self {
            column: "signal",
            samples,
            labels,
            labelled_only: false,
            metadata: None,
        }
    }
}
#[derive(Debug, Serialize)]
struct SignalRow {
    index: usize,
    value: f64,
    label: u8,
}
#[derive(Debug, Serialize)]
struct RegionRow {
    #[serde(rename = "ID")]
    id: usize,
    #[serde(rename = "Start")]
    start: usize,
    #[serde(rename = "End")]
    end: usize,
    #[serde(rename = "Width")]
    width: usize,
    #[serde(rename = "FWHM")]
    fwhm: f64,
    #[serde(rename = "MaxVal")]
    max_value: f64,
    #[serde(rename = "Area")]
    area: f64,
}
/// Write `index,<column>,label` rows.
pub fn write_signal_csv<W: Write>(mut out: W, table: &SignalTable) -> Result<()> {
    if let Some(meta) = table.metadata {
        writeln!(out, "# METADATA: {meta}").map_err(csv::Error::from)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(["index", table.column, "label"])?;
    for (index, &value) in table.samples.iter().enumerate() {
        let label = table.labels.get(index).copied().unwrap_or(0);
        if table.labelled_only && label == 0 {
            continue;
        }
        writer.serialize(SignalRow {
            index,
            value,
            label,
        })?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
/// Write one `ID,Start,End,Width,FWHM,MaxVal,Area` row per region.
pub fn write_regions_csv<W: Write>(out: W, metrics: &[RegionMetrics]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for m in metrics {
        writer.serialize(RegionRow {
            id: m.id,
            start: m.start,
            end: m.end,
            width: m.width,
            fwhm: m.fwhm,
            max_value: m.max_value,
            area: m.area,
        })?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::regions::{measure_regions, Region};
    fn lines(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }
    #[test]
    fn signal_rows_follow_header() {
        let mut bytes = Vec::new();
        let samples = [0.5, -1.25, 2.0];
        write_signal_csv(&mut bytes, &SignalTable::new(&samples, &[0, 2])).unwrap();
        let lines = lines(bytes);
        assert_eq!(lines[0], "index,signal,label");
        assert_eq!(lines[1], "0,0.5,0");
        assert_eq!(lines[2], "1,-1.25,2");
        assert!(lines[3].starts_with("2,2"));
        assert!(lines[3].ends_with(",0"));
        assert_eq!(lines.len(), 4);
    }
    #[test]
    fn labelled_only_with_metadata_and_renamed_column() {
        let mut bytes = Vec::new();
        let samples = [0.5, 0.25, 0.75];
        let table = SignalTable {
            column: "smoothed_signal",
            labelled_only: true,
            metadata: Some("{\"channel\":\"CH1\"}"),
            ..SignalTable::new(&samples, &[0, 1, 0])
        };
        write_signal_csv(&mut bytes, &table).unwrap();
        assert_eq!(
            lines(bytes),
            vec![
                "# METADATA: {\"channel\":\"CH1\"}",
                "index,smoothed_signal,label",
                "1,0.25,1",
            ]
        );
    }
    #[test]
    fn region_table_has_one_row_per_region() {
        let samples = [0.0, 1.0, 2.0, 1.0, 0.0, 0.0, 0.5, 0.0];
        let regions = [
            Region { label: 2, start: 0, end: 4 },
            Region { label: 1, start: 6, end: 6 },
        ];
        let metrics = measure_regions(&samples, &regions, 0.0);
        let mut bytes = Vec::new();
        write_regions_csv(&mut bytes, &metrics).unwrap();
        let lines = lines(bytes);
        assert_eq!(lines[0], "ID,Start,End,Width,FWHM,MaxVal,Area");
        let first: Vec<f64> = lines[1].split(',').map(|f| f.parse().unwrap()).collect();
        assert_eq!(first, vec![1.0, 0.0, 4.0, 5.0, 2.0, 2.0, 4.0]);
        assert!(lines[2].starts_with("2,6,6,1,"));
        assert_eq!(lines.len(), 3);
    }
    #[test]
    fn empty_region_table_writes_nothing() {
        let mut bytes = Vec::new();
        write_regions_csv(&mut bytes, &[]).unwrap();
        assert!(bytes.is_empty());
    }
}
