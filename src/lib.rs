//! # moi-client
//!
//! Client for the moi notification channel: one WebSocket over which a job
//! server pushes job and group status changes, multiplexed by an action key.
//!
//! ## Architecture
//!
//! ```text
//! moi server (ws:// or wss://)
//!     │
//!     ├── Transport (transport/)      WsConnector · MemoryConnector
//!     │
//!     ├── NotificationClient (channel/)
//!     │       ├── CallbackRegistry    action → handler
//!     │       ├── ChannelHandle       send · force_resync · close
//!     │       └── resync timer
//!     │
//!     ├── Frame codec (protocol/)     {"<action>": <payload>}
//!     │
//!     └── RecordList (tracker/)       tracked jobs and groups
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use moi_client::channel::{Hooks, NotificationClient};
//! use moi_client::config::ClientConfig;
//! use moi_client::protocol::Action;
//! use moi_client::transport::WsConnector;
//!
//! # async fn demo() -> Result<(), moi_client::error::ChannelError> {
//! let config = ClientConfig::from_env()?;
//! let mut client = NotificationClient::from_config(&config, WsConnector::new());
//! client.add_callback(Action::Update, |payload| println!("update: {payload}"));
//! client.init(Hooks::new()).await?;
//! client.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod protocol;
pub mod tracker;
pub mod transport;
