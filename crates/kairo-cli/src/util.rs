use crate::error::invalid_input;
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use kairo_core::domain::UserId;
use std::str::FromStr;

pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

pub fn format_timestamp_date(ts: i64) -> String {
    match DateTime::<Utc>::from_timestamp(ts, 0) {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        None => ts.to_string(),
    }
}

pub fn parse_user_id(raw: &str) -> Result<UserId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid_input("user id cannot be empty"));
    }
    UserId::from_str(trimmed).map_err(|_| invalid_input(format!("invalid user id: {trimmed}")))
}
