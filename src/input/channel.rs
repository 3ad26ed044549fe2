//! Channel-backed input source for embedding and tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{InputError, InputSource, KioskInput};

/// Input source fed through an mpsc channel.
///
/// Dropping every sender ends the source.
pub struct ChannelSource {
    rx: mpsc::Receiver<KioskInput>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it.
    pub fn new(capacity: usize) -> (mpsc::Sender<KioskInput>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

#[async_trait]
impl InputSource for ChannelSource {
    async fn next_input(&mut self) -> Result<Option<KioskInput>, InputError> {
        Ok(self.rx.recv().await)
    }
}
