use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::tracker::shared::Shared;

use super::loop_worker::{face_loop, text_loop};

/// Owns the polling tasks of one capture.
pub struct SensingController {
    face_handle: Option<JoinHandle<()>>,
    text_handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for SensingController {
    fn default() -> Self {
        Self::new()
    }
}

impl SensingController {
    pub fn new() -> Self {
        Self {
            face_handle: None,
            text_handle: None,
            cancel_token: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel_token.is_some()
    }

    pub(crate) fn start_sensing(&mut self, shared: Arc<Shared>, epoch: u64, with_text: bool) -> Result<()> {
        if self.is_active() {
            bail!("sensing already active");
        }

        let cancel_token = CancellationToken::new();

        self.face_handle = Some(tokio::spawn(face_loop(
            Arc::clone(&shared),
            epoch,
            cancel_token.clone(),
        )));
        if with_text {
            self.text_handle = Some(tokio::spawn(text_loop(shared, epoch, cancel_token.clone())));
        }
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Stops face polling and waits for it to finish. The text loop is only
    /// signalled: an in-flight recognition completes in the background.
    pub async fn stop_sensing(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if self.text_handle.take().is_some() {
            info!("Text poll loop signalled; any in-flight recognition will be discarded");
        }

        if let Some(handle) = self.face_handle.take() {
            handle
                .await
                .context("face poll task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
