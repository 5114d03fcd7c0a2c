use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ScanTarget, ScanType};

/// A recurring scan definition. Stored only; nothing triggers it yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledScan {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub target: ScanTarget,
    pub cron_expression: String,
    pub enabled: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ScheduledScanCreate {
    pub name: String,
    pub scan_type: Option<String>,
    pub target: ScanTarget,
    pub cron_expression: String,
}
