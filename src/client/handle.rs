//! Store Handle
//!
//! Runs a [`RealtimeClientStore`] on its own task and hands out a cloneable
//! [`StoreHandle`] for presentation code: commands go in over a channel,
//! state comes out through a watch receiver.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::error::{StoreError, StoreResult};
use super::store::RealtimeClientStore;
use crate::store::{ChannelId, ChatState, ConnectionState};
use crate::transport::Transport;

/// Operations forwarded to the driver task
#[derive(Debug)]
enum Command {
    Connect {
        address: String,
    },
    Disconnect,
    SendMessage {
        channel_id: ChannelId,
        content: String,
        username: String,
        display_name: String,
    },
    StartTyping {
        channel_id: ChannelId,
    },
    StopTyping {
        channel_id: ChannelId,
    },
    Shutdown,
}

/// Cloneable handle to a running store
#[derive(Debug, Clone)]
pub struct StoreHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ChatState>,
}

impl StoreHandle {
    pub fn connect(&self, address: impl Into<String>) -> StoreResult<()> {
        self.send(Command::Connect {
            address: address.into(),
        })
    }

    pub fn disconnect(&self) -> StoreResult<()> {
        self.send(Command::Disconnect)
    }

    /// Send a message as the local user. Dropped by the store if not connected.
    pub fn send_message(
        &self,
        channel_id: impl Into<ChannelId>,
        content: impl Into<String>,
        username: impl Into<String>,
        display_name: impl Into<String>,
    ) -> StoreResult<()> {
        self.send(Command::SendMessage {
            channel_id: channel_id.into(),
            content: content.into(),
            username: username.into(),
            display_name: display_name.into(),
        })
    }

    pub fn start_typing(&self, channel_id: impl Into<ChannelId>) -> StoreResult<()> {
        self.send(Command::StartTyping {
            channel_id: channel_id.into(),
        })
    }

    pub fn stop_typing(&self, channel_id: impl Into<ChannelId>) -> StoreResult<()> {
        self.send(Command::StopTyping {
            channel_id: channel_id.into(),
        })
    }

    /// Disconnect and stop the driver task, discarding all chat state
    pub fn shutdown(&self) -> StoreResult<()> {
        self.send(Command::Shutdown)
    }

    /// Latest chat state
    ///
    /// Do not hold the returned guard across an await point.
    pub fn state(&self) -> watch::Ref<'_, ChatState> {
        self.state.borrow()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.clone()
    }

    pub fn connection(&self) -> ConnectionState {
        self.state.borrow().connection()
    }

    fn send(&self, command: Command) -> StoreResult<()> {
        self.commands.send(command).map_err(|_| StoreError::Closed)
    }
}

impl<T> RealtimeClientStore<T>
where
    T: Transport + Send + 'static,
    T::Link: Send + 'static,
{
    /// Move the store onto a tokio task
    pub fn spawn(self) -> (StoreHandle, JoinHandle<()>) {
        let (commands, rx) = mpsc::unbounded_channel();
        let handle = StoreHandle {
            commands,
            state: self.subscribe(),
        };
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!("Realtime store task started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.execute(command) {
                            break;
                        }
                    }
                    None => break,
                },
                () = self.process_next() => {}
            }
        }

        self.disconnect();
        tracing::info!("Realtime store stopped");
    }

    /// Apply one command. Returns `false` once the task should stop.
    fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Connect { address } => self.connect(&address),
            Command::Disconnect => self.disconnect(),
            Command::SendMessage {
                channel_id,
                content,
                username,
                display_name,
            } => {
                self.send_message(&channel_id, &content, &username, &display_name);
            }
            Command::StartTyping { channel_id } => {
                self.start_typing(&channel_id);
            }
            Command::StopTyping { channel_id } => {
                self.stop_typing(&channel_id);
            }
            Command::Shutdown => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    async fn wait_for(
        rx: &mut watch::Receiver<ChatState>,
        condition: impl FnMut(&ChatState) -> bool,
    ) {
        tokio::time::timeout(std::time::Duration::from_secs(5), rx.wait_for(condition))
            .await
            .expect("timed out waiting for state")
            .expect("store task ended");
    }

    #[tokio::test]
    async fn test_handle_drives_store() {
        let transport = MemoryTransport::new();
        let (handle, _task) = RealtimeClientStore::new(transport.clone()).spawn();
        let mut rx = handle.subscribe();

        handle.connect("ws://localhost:9001").unwrap();
        wait_for(&mut rx, |s| s.connection() == ConnectionState::Connecting).await;

        let conn = transport.last().unwrap();
        conn.open();
        wait_for(&mut rx, |s| s.connection().is_connected()).await;

        handle.send_message("c1", "hello", "ada", "Ada").unwrap();
        wait_for(&mut rx, |s| s.channel_messages("c1").len() == 1).await;
        assert_eq!(conn.sent().len(), 1);

        handle.start_typing("c1").unwrap();
        handle.stop_typing("c1").unwrap();
        handle.disconnect().unwrap();
        wait_for(&mut rx, |s| s.connection() == ConnectionState::Disconnected).await;

        assert_eq!(conn.sent().len(), 3);
        assert!(conn.is_closed());
        assert_eq!(handle.connection(), ConnectionState::Disconnected);
        assert_eq!(handle.state().channel_messages("c1").len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_closes_transport_and_rejects_commands() {
        let transport = MemoryTransport::new();
        let (handle, task) = RealtimeClientStore::new(transport.clone()).spawn();
        let mut rx = handle.subscribe();

        handle.connect("ws://localhost:9001").unwrap();
        wait_for(&mut rx, |s| s.connection() == ConnectionState::Connecting).await;

        handle.shutdown().unwrap();
        task.await.unwrap();

        assert!(transport.last().unwrap().is_closed());
        assert!(matches!(handle.connect("ws://localhost:9001"), Err(StoreError::Closed)));
        assert!(matches!(handle.send_message("c1", "x", "a", "A"), Err(StoreError::Closed)));
    }

    #[tokio::test]
    async fn test_store_stops_when_handles_dropped() {
        let (handle, task) = RealtimeClientStore::new(MemoryTransport::new()).spawn();
        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_only_shutdown_stops_execution() {
        let transport = MemoryTransport::new();
        let mut store = RealtimeClientStore::new(transport.clone());

        assert!(store.execute(Command::Connect {
            address: "ws://localhost:9001".to_string(),
        }));
        assert!(store.execute(Command::StartTyping {
            channel_id: "c1".to_string(),
        }));
        assert!(store.execute(Command::Disconnect));
        assert!(!store.execute(Command::Shutdown));
        assert!(transport.last().unwrap().is_closed());
    }
}
