use chrono::{DateTime, Utc};
use evm_client::U256;
use serde::Serialize;

use crate::component::Handle;
use crate::status::{MetadataOutcome, StatusReport};
use crate::wiring::WiredLink;
use crate::workflow::{DriveOutcome, Phase, StepOutcome};

/// Everything one run resolved, issued and read.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub components: Vec<Handle>,
    pub wiring: Vec<WiredLink>,
    pub steps: Vec<StepOutcome>,
    pub token_id: U256,
    pub raffle_id: U256,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusReport>,
}

impl RunReport {
    pub fn new(
        started_at: DateTime<Utc>,
        components: Vec<Handle>,
        wiring: Vec<WiredLink>,
        drive: DriveOutcome,
        status: Option<StatusReport>,
    ) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            components,
            wiring,
            steps: drive.steps,
            token_id: drive.token_id,
            raffle_id: drive.raffle_id,
            phase: drive.phase,
            status,
        }
    }

    /// Human-readable lines, one fact per line.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for c in &self.components {
            out.push(format!("{:<16} {} ({})", c.kind.to_string(), c.address, c.provenance));
        }
        for w in &self.wiring {
            out.push(format!("linked {:<22} tx {}", w.link.as_str(), w.tx));
        }
        for s in self.steps.iter().filter(|s| s.executed) {
            let mut line = format!("{:<28} {}", s.name, s.actor);
            if let Some(id) = s.resolved {
                line.push_str(&format!(" -> {id}"));
            }
            if !s.txs.is_empty() {
                line.push_str(&format!(" ({} tx)", s.txs.len()));
            }
            out.push(line);
        }
        out.push(format!("token id   {}", self.token_id));
        out.push(format!("raffle id  {}", self.raffle_id));
        out.push(format!("phase      {}", self.phase));

        if let Some(status) = &self.status {
            out.push(format!("raffle     {}", status.raffle));
            out.push(format!("entrants   {}", status.participants));
            out.push(format!("request    {} {}", status.last_request_id, status.request_status));
            out.push(format!("token uri  {}", status.token_uri));
            match &status.metadata {
                MetadataOutcome::Fetched { body } => out.push(format!("metadata   {body}")),
                MetadataOutcome::Failed { error } => {
                    out.push(format!("metadata   unavailable: {error}"))
                }
            }
        }
        out
    }
}
