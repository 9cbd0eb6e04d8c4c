//! `generate_report`.
//!
//! Submits a report job and returns it without waiting for rows. With both
//! `start_date` and `end_date` the report covers that inclusive range,
//! otherwise the last seven days.

use chrono::NaiveDate;
use serde_json::{json, Value};

use super::{string_arg, success};
use crate::admanager::model::{DateRange, ReportQuery, ReportType};
use crate::admanager::AdManagerApi;
use crate::error::ToolError;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(super) async fn handle(api: &dyn AdManagerApi, arguments: &Value) -> Result<Value, ToolError> {
    let report_type = match string_arg(arguments, "report_type") {
        None => ReportType::Inventory,
        Some(name) => ReportType::parse(&name)
            .ok_or_else(|| ToolError::UnsupportedAction(format!("report_type {name}")))?,
    };
    let date_range = date_range(arguments)?;

    let query = ReportQuery::for_type(report_type, date_range);
    let job = api.run_report(&query).await?;

    Ok(success(
        "generate_report",
        json!({
            "report_type": report_type.as_str(),
            "job": job,
            "message": "报告作业已创建，请通过报告ID查询结果",
        }),
    ))
}

fn date_range(arguments: &Value) -> Result<DateRange, ToolError> {
    match (
        string_arg(arguments, "start_date"),
        string_arg(arguments, "end_date"),
    ) {
        (Some(start), Some(end)) => Ok(DateRange::Custom {
            start_date: parse_date("start_date", &start)?.into(),
            end_date: parse_date("end_date", &end)?.into(),
        }),
        _ => Ok(DateRange::Last7Days),
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| ToolError::InvalidArgument {
        field,
        reason: format!("{value:?} is not a YYYY-MM-DD date ({e})"),
    })
}
