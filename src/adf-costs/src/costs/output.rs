use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::report::{CostReport, SummaryRow};
use crate::config::Config;
use crate::constants::TOTAL_ROW_SENTINEL;

pub const DETAILED_HEADER: [&str; 15] = [
    "Run_id",
    "Pipeline_name",
    "activity_name",
    "activity_run_id",
    "status",
    "activity_run_start",
    "activity_run_end",
    "meter_type",
    "duration",
    "activity_type",
    "unit",
    "Type",
    "IR",
    "Costs_per_Unit",
    "costs_per_activity",
];

pub const SUMMARY_HEADER: [&str; 8] = [
    "Run_id",
    "Pipeline_name",
    "activity_type",
    "unit",
    "meter_type",
    "Costs_per_Unit",
    "duration",
    "costs_per_activity",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub decimal_comma: bool,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            decimal_comma: false,
        }
    }
}

impl From<&Config> for CsvFormat {
    fn from(config: &Config) -> Self {
        Self {
            delimiter: config.delimiter_byte(),
            decimal_comma: config.decimal_comma,
        }
    }
}

impl CsvFormat {
    fn number(&self, value: f64) -> String {
        let text = value.to_string();
        if self.decimal_comma {
            text.replace('.', ",")
        } else {
            text
        }
    }

    fn optional_number(&self, value: Option<f64>) -> String {
        value.map(|v| self.number(v)).unwrap_or_default()
    }

    fn writer<W: Write>(&self, inner: W) -> csv::Writer<W> {
        csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(inner)
    }
}

pub fn write_detailed<W: Write>(inner: W, report: &CostReport, format: CsvFormat) -> Result<()> {
    let mut writer = format.writer(inner);
    writer.write_record(DETAILED_HEADER)?;

    for record in &report.records {
        let activity = &record.activity;
        let (rate_type, rate_ir) = record
            .rate
            .as_ref()
            .map(|rate| (rate.activity_type.as_str(), rate.execution_environment.as_str()))
            .unwrap_or_default();

        writer.write_record([
            activity.run_id.as_str(),
            activity.pipeline_name.as_str(),
            activity.activity_name.as_str(),
            activity.activity_run_id.as_str(),
            activity.status.as_str(),
            activity.start_time.as_deref().unwrap_or_default(),
            activity.end_time.as_deref().unwrap_or_default(),
            activity.meter_type.as_str(),
            format.number(activity.duration).as_str(),
            activity.activity_type.as_str(),
            activity.unit.as_str(),
            rate_type,
            rate_ir,
            format.optional_number(record.cost_per_unit()).as_str(),
            format.optional_number(record.cost_per_activity).as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_summary<W: Write>(inner: W, rows: &[SummaryRow], format: CsvFormat) -> Result<()> {
    let mut writer = format.writer(inner);
    writer.write_record(SUMMARY_HEADER)?;

    for row in rows {
        match row {
            SummaryRow::Group(group) => writer.write_record([
                group.run_id.as_str(),
                group.pipeline_name.as_str(),
                group.activity_type.as_str(),
                group.unit.as_str(),
                group.meter_type.as_str(),
                format.optional_number(group.cost_per_unit).as_str(),
                format.number(group.duration).as_str(),
                format.optional_number(group.cost).as_str(),
            ])?,
            SummaryRow::Total { cost } => writer.write_record([
                TOTAL_ROW_SENTINEL,
                "",
                "",
                "",
                "",
                "",
                "",
                format.number(*cost).as_str(),
            ])?,
        }
    }

    writer.flush()?;
    Ok(())
}

pub fn write_detailed_file(path: &Path, report: &CostReport, format: CsvFormat) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_detailed(file, report, format)
        .with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_summary_file(path: &Path, rows: &[SummaryRow], format: CsvFormat) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_summary(file, rows, format).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::billing::ActivityRun;
    use crate::costs::report::CostReporter;

    fn activity(meter_type: &str, duration: f64) -> ActivityRun {
        ActivityRun {
            run_id: "run-1".to_string(),
            pipeline_name: "load".to_string(),
            activity_name: "Copy, then load".to_string(),
            activity_run_id: "act-1".to_string(),
            status: "Succeeded".to_string(),
            start_time: Some("2024-05-01T08:00:00.1234567Z".to_string()),
            end_time: None,
            meter_type: meter_type.to_string(),
            duration,
            activity_type: "DataMovement".to_string(),
            unit: "DIUHours".to_string(),
        }
    }

    fn render(write: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> Vec<String> {
        let mut buffer = Vec::new();
        write(&mut buffer).unwrap();
        String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn detailed_rows_include_join_columns() {
        let report = CostReporter::default()
            .build_report(&[activity("AzureIR", 10.0), activity("UnknownIR", 1.5)]);

        let lines = render(|buf| write_detailed(buf, &report, CsvFormat::default()));

        assert_eq!(lines[0], DETAILED_HEADER.join(","));
        assert_eq!(
            lines[1],
            "run-1,load,\"Copy, then load\",act-1,Succeeded,2024-05-01T08:00:00.1234567Z,,AzureIR,10,DataMovement,DIUHours,DataMovement,AzureIR,0.225,2.25"
        );
        assert_eq!(
            lines[2],
            "run-1,load,\"Copy, then load\",act-1,Succeeded,2024-05-01T08:00:00.1234567Z,,UnknownIR,1.5,DataMovement,DIUHours,,,,"
        );
    }

    #[test]
    fn summary_ends_with_total_row() {
        let report = CostReporter::default()
            .build_report(&[activity("AzureIR", 10.0), activity("AzureIR", 2.0)]);

        let lines = render(|buf| write_summary(buf, &report.summarize(), CsvFormat::default()));

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], SUMMARY_HEADER.join(","));
        assert!(lines[1].starts_with("run-1,load,DataMovement,DIUHours,AzureIR,0.225,12,"));
        assert!(lines[2].starts_with("TOTAL,,,,,,,"));
    }

    #[test]
    fn decimal_comma_is_quoted_against_comma_delimiter() {
        let report = CostReporter::default().build_report(&[activity("AzureIR", 0.5)]);
        let format = CsvFormat {
            delimiter: b',',
            decimal_comma: true,
        };

        let lines = render(|buf| write_detailed(buf, &report, format));
        assert!(lines[1].contains(",\"0,5\",DataMovement,"));
        assert!(lines[1].ends_with(",\"0,225\",\"0,1125\""));
    }

    #[test]
    fn semicolon_delimiter_keeps_decimal_comma_unquoted() {
        let report = CostReporter::default().build_report(&[activity("AzureIR", 0.5)]);
        let format = CsvFormat {
            delimiter: b';',
            decimal_comma: true,
        };

        let lines = render(|buf| write_detailed(buf, &report, format));
        assert!(lines[0].starts_with("Run_id;Pipeline_name;"));
        assert!(lines[1].ends_with(";0,225;0,1125"));
    }

    #[test]
    fn files_are_written_to_the_given_paths() {
        let dir = tempfile::tempdir().unwrap();
        let detailed = dir.path().join("costs.csv");
        let summary = dir.path().join("summary.csv");
        let report = CostReporter::default().build_report(&[activity("AzureIR", 4.0)]);

        write_detailed_file(&detailed, &report, CsvFormat::default()).unwrap();
        write_summary_file(&summary, &report.summarize(), CsvFormat::default()).unwrap();

        let written = std::fs::read_to_string(&detailed).unwrap();
        assert_eq!(written.lines().count(), 2);
        let written = std::fs::read_to_string(&summary).unwrap();
        assert!(written.lines().last().unwrap().starts_with("TOTAL"));
    }
}
