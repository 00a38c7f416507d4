use serde::Serialize;

use super::{mean_of, valid_records};
use crate::models::record::Record;

/// Records in each comparison window.
pub const TREND_WINDOW: usize = 10;
/// Points either side of the older mean that still count as stable.
pub const TREND_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

/// Compare the newest window against the one before it.
///
/// `records` must be sorted newest first. Without an older window the trend is
/// stable.
pub fn classify_trend(records: &[Record]) -> Trend {
    trend_of(&valid_records(records))
}

pub(crate) fn trend_of(valid: &[&Record]) -> Trend {
    let recent_len = valid.len().min(TREND_WINDOW);
    let older_end = valid.len().min(TREND_WINDOW * 2);
    let recent = &valid[..recent_len];
    let older = &valid[recent_len..older_end];

    let Some(recent_mean) = mean_of(recent) else {
        return Trend::Stable;
    };
    let older_mean = mean_of(older).unwrap_or(recent_mean);

    if recent_mean > older_mean + TREND_THRESHOLD {
        Trend::Improving
    } else if recent_mean < older_mean - TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}
