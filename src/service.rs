//! Refresh service main loop
//!
//! A single task owns the ticker and handles manual commands, so refresh
//! cycles never overlap: the next trigger is only looked at once the current
//! cycle has finished.

use crate::error::{Result, UvoError};
use crate::logging::{StructuredLogger, get_logger};
use crate::registry::{AccountSummary, RefreshReport, SharedRegistry};
use crate::schedule::{RefreshSchedule, RefreshTicker};
use tokio::sync::{mpsc, oneshot, watch};

/// Commands accepted by the service loop
#[derive(Debug)]
pub enum ServiceCommand {
    /// Refresh every account now; the report is sent back if a reply channel is given
    UpdateState {
        reply: Option<oneshot::Sender<RefreshReport>>,
    },
}

/// Cloneable handle used by the web surface and signal handlers
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    commands_tx: mpsc::UnboundedSender<ServiceCommand>,
    shutdown_tx: mpsc::UnboundedSender<()>,
    status_rx: watch::Receiver<Vec<AccountSummary>>,
}

impl ServiceHandle {
    /// Trigger the `update_state` command and wait for its report
    pub async fn update_state(&self) -> Result<RefreshReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands_tx
            .send(ServiceCommand::UpdateState {
                reply: Some(reply_tx),
            })
            .map_err(|_| UvoError::generic("Refresh service is not running"))?;
        reply_rx
            .await
            .map_err(|_| UvoError::generic("Refresh service stopped before replying"))
    }

    /// Account snapshot as of the last published cycle. Never waits on a
    /// refresh in progress.
    pub fn accounts(&self) -> Vec<AccountSummary> {
        self.status_rx.borrow().clone()
    }

    /// Ask the loop to stop after the current cycle
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

pub struct UvoService {
    registry: SharedRegistry,
    ticker: RefreshTicker,
    commands_rx: mpsc::UnboundedReceiver<ServiceCommand>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
    status_tx: watch::Sender<Vec<AccountSummary>>,
    logger: StructuredLogger,
    total_cycles: u64,
}

impl UvoService {
    pub fn new(registry: SharedRegistry, schedule: RefreshSchedule) -> (Self, ServiceHandle) {
        Self::with_ticker(registry, RefreshTicker::new(schedule))
    }

    pub fn with_ticker(registry: SharedRegistry, ticker: RefreshTicker) -> (Self, ServiceHandle) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        // Nothing else holds the registry while components are being wired
        let initial = registry
            .try_lock()
            .map(|reg| reg.summaries())
            .unwrap_or_default();
        let (status_tx, status_rx) = watch::channel(initial);
        let service = Self {
            registry,
            ticker,
            commands_rx,
            shutdown_rx,
            status_tx,
            logger: get_logger("service"),
            total_cycles: 0,
        };
        let handle = ServiceHandle {
            commands_tx,
            shutdown_tx,
            status_rx,
        };
        (service, handle)
    }

    pub fn schedule(&self) -> &RefreshSchedule {
        self.ticker.schedule()
    }

    /// Registry-wide refresh cycles run so far by this loop
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Refresh every account once
    pub async fn update_all(&mut self) -> RefreshReport {
        let report = {
            let mut registry = self.registry.lock().await;
            let report = registry.update_all().await;
            self.status_tx.send_replace(registry.summaries());
            report
        };
        self.total_cycles = self.total_cycles.saturating_add(1);
        if report.failed() > 0 {
            self.logger.warn(&format!(
                "Refresh finished: {} ok, {} failed",
                report.succeeded(),
                report.failed()
            ));
        } else {
            self.logger.debug(&format!(
                "Refresh finished: {} account(s) updated",
                report.succeeded()
            ));
        }
        report
    }

    /// Republish the account snapshot outside a refresh cycle, e.g. after
    /// listeners were added
    pub async fn publish_status(&self) {
        let summaries = self.registry.lock().await.summaries();
        self.status_tx.send_replace(summaries);
    }

    /// Run until shutdown is requested or every handle is dropped
    pub async fn run(&mut self) -> Result<()> {
        let schedule = *self.ticker.schedule();
        self.logger.info(&format!(
            "Starting refresh loop: every {} min at minute offset {} second {}",
            schedule.interval_minutes(),
            schedule.minute_offset(),
            schedule.second()
        ));

        loop {
            tokio::select! {
                fired_at = self.ticker.tick() => {
                    self.logger.debug(&format!("Scheduled refresh at {}", fired_at.to_rfc3339()));
                    self.update_all().await;
                }
                cmd = self.commands_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            self.logger.info("All service handles dropped");
                            break;
                        }
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.logger.info("Refresh loop stopped");
        Ok(())
    }

    async fn handle_command(&mut self, cmd: ServiceCommand) {
        match cmd {
            ServiceCommand::UpdateState { reply } => {
                self.logger.info("Manual update_state requested");
                let report = self.update_all().await;
                if let Some(reply) = reply {
                    let _ = reply.send(report);
                }
            }
        }
    }
}
