//! Gateway that writes each persistence call as a JSON line instead of
//! sending it anywhere.

use std::io::Write;
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use rota_service::schedule::{
    BulkDeleteShiftCommand, BulkUpdateShiftCommand, DeleteShiftCommand, ShiftGateway,
    UpdateShiftCommand,
};
use serde::Serialize;

#[derive(Serialize)]
struct Call<'a, C> {
    call: &'static str,
    command: &'a C,
}

pub struct JsonGateway<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonGateway<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// ## Errors
    /// Returns an error if the writer lock was poisoned.
    pub fn into_inner(self) -> anyhow::Result<W> {
        self.out
            .into_inner()
            .map_err(|_err| anyhow::anyhow!("gateway writer poisoned"))
    }

    fn emit<C: Serialize>(&self, call: &'static str, command: &C) -> anyhow::Result<()> {
        let line = serde_json::to_string(&Call { call, command })
            .with_context(|| format!("serializing {call}"))?;
        let mut out = self
            .out
            .lock()
            .map_err(|_err| anyhow::anyhow!("gateway writer poisoned"))?;
        writeln!(out, "{line}").with_context(|| format!("writing {call}"))?;
        tracing::debug!(call, "Emitted gateway call");
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> ShiftGateway for JsonGateway<W> {
    async fn update_shift(&self, command: &UpdateShiftCommand) -> anyhow::Result<()> {
        self.emit("updateShift", command)
    }

    async fn bulk_update_shifts(&self, command: &BulkUpdateShiftCommand) -> anyhow::Result<()> {
        self.emit("bulkUpdateShifts", command)
    }

    async fn delete_shift(&self, command: &DeleteShiftCommand) -> anyhow::Result<()> {
        self.emit("deleteShift", command)
    }

    async fn bulk_delete_shifts(&self, command: &BulkDeleteShiftCommand) -> anyhow::Result<()> {
        self.emit("bulkDeleteShifts", command)
    }
}
