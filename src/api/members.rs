//! Snapshot presenter
//!
//! Every request takes one snapshot of the membership table and renders it
//! completely before anything is written to the client, so a viewer sees
//! either a whole listing or an error, never a partial table.

use std::fmt::Write;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::response::ApiResponse;
use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::models::MemberRecord;

#[derive(Debug, Serialize)]
pub struct MembersSnapshot {
    pub generated_at: DateTime<Utc>,
    pub count: usize,
    pub members: Vec<MemberSummary>,
}

#[derive(Debug, Serialize)]
pub struct MemberSummary {
    pub identity: String,
    pub source_address: String,
    pub last_seen: DateTime<Utc>,
    pub age_seconds: i64,
}

impl MemberSummary {
    fn from_record(record: MemberRecord, now: DateTime<Utc>) -> Self {
        let age_seconds = record.age(now).num_seconds();
        Self {
            identity: record.identity,
            source_address: record.source_address,
            last_seen: record.last_seen,
            age_seconds,
        }
    }
}

/// HTML listing of live members
pub async fn list_html(State(state): State<AppState>) -> AppResult<Response> {
    let generated_at = Utc::now();
    let records = state.table.snapshot().await;
    let html = render_html(&records, generated_at, state.config.beacon_interval_secs)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
        .into_response())
}

/// JSON snapshot of live members
pub async fn list_json(State(state): State<AppState>) -> ApiResponse<MembersSnapshot> {
    let generated_at = Utc::now();
    let members: Vec<MemberSummary> = state
        .table
        .snapshot()
        .await
        .into_iter()
        .map(|r| MemberSummary::from_record(r, generated_at))
        .collect();

    ApiResponse::success(MembersSnapshot {
        generated_at,
        count: members.len(),
        members,
    })
}

/// Single member by source address
pub async fn get_member(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<ApiResponse<MemberSummary>> {
    let record = state
        .table
        .get(&address)
        .await
        .ok_or_else(|| AppError::not_found(&format!("No live member at {}", address)))?;

    Ok(ApiResponse::success(MemberSummary::from_record(record, Utc::now())))
}

pub fn render_html(
    records: &[MemberRecord],
    generated_at: DateTime<Utc>,
    interval_secs: u64,
) -> AppResult<String> {
    let mut html = String::with_capacity(2048 + records.len() * 160);
    write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta http-equiv="refresh" content="30">
    <title>Live Hosts</title>
    <link rel="stylesheet" href="/public/style.css">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; color: #333; }}
        .container {{ max-width: 1000px; margin: 0 auto; background: white; padding: 20px 30px; border-radius: 8px; }}
        .meta {{ color: #666; font-size: 0.9em; margin-bottom: 15px; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ padding: 10px 15px; text-align: left; border-bottom: 1px solid #eee; }}
        th {{ background: #f8f9fa; font-weight: 600; color: #555; }}
        .empty {{ color: #999; font-style: italic; padding: 20px; text-align: center; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Live Hosts</h1>
        <div class="meta">
            <strong>Members:</strong> {count}<br>
            <strong>Beacon interval:</strong> {interval}s<br>
            <strong>Generated:</strong> {generated_at}
        </div>
"#,
        count = records.len(),
        interval = interval_secs,
        generated_at = generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )?;

    if records.is_empty() {
        html.push_str("        <div class=\"empty\">No hosts have reported</div>\n");
    } else {
        html.push_str(
            "        <table><thead><tr><th>Host</th><th>Address</th><th>Last Seen</th></tr></thead><tbody>\n",
        );
        for record in records {
            writeln!(
                html,
                "            <tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&record.identity),
                escape_html(&record.source_address),
                record.last_seen.format("%Y-%m-%d %H:%M:%S UTC"),
            )?;
        }
        html.push_str("        </tbody></table>\n");
    }

    html.push_str("    </div>\n</body>\n</html>\n");
    Ok(html)
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
