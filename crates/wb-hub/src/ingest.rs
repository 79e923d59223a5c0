//! # Ingestion Loops
//!
//! One loop per connection, chosen by its mode at registration. Reads are
//! strictly sequential. The loop is the only place that deregisters its
//! connection after a transport failure.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wb_core::ConnectionMode;

use crate::connection::ConnectionReader;
use crate::registry::ConnectionRegistry;
use crate::text_buffer::TextBuffer;
use crate::workers::{PersistRequest, Signal};

pub(crate) struct IngestContext {
    pub registry: Arc<ConnectionRegistry>,
    pub persist: mpsc::Sender<PersistRequest>,
    pub signals: mpsc::Sender<Signal>,
    pub text: Arc<TextBuffer>,
    pub deregister_on_invalid_thread: bool,
}

pub(crate) async fn run(reader: ConnectionReader, mode: ConnectionMode, ctx: IngestContext) {
    match mode {
        ConnectionMode::Broadcast => thread_loop(reader, ctx).await,
        ConnectionMode::Paired => paired_loop(reader, ctx).await,
    }
}

async fn thread_loop(mut reader: ConnectionReader, ctx: IngestContext) {
    let id = reader.id();

    loop {
        let thread = match reader.receive_thread().await {
            Ok(thread) => thread,
            Err(e) => {
                ctx.registry.remove(id).await;
                info!(conn_id = %id, reason = %e, "websocket closed, connection removed");
                return;
            }
        };

        if let Err(e) = thread.validate() {
            warn!(conn_id = %id, error = %e, "invalid thread from connection, reader stopped");
            if ctx.deregister_on_invalid_thread {
                if let Some(conn) = ctx.registry.remove(id).await {
                    conn.close().await;
                    info!(conn_id = %id, "connection removed after invalid thread");
                }
            }
            return;
        }

        // Blocks while the persistence queue is full.
        if ctx.persist.send(PersistRequest { thread, reply: None }).await.is_err() {
            debug!(conn_id = %id, "persistence queue closed, reader stopped");
            return;
        }
    }
}

async fn paired_loop(mut reader: ConnectionReader, ctx: IngestContext) {
    let id = reader.id();

    loop {
        let text = match reader.receive_raw_text().await {
            Ok(text) => text,
            Err(e) => {
                ctx.registry.remove(id).await;
                info!(conn_id = %id, reason = %e, "paired connection closed, connection removed");
                return;
            }
        };

        ctx.text.replace(text).await;

        if ctx.signals.send(Signal::TextUpdate).await.is_err() {
            debug!(conn_id = %id, "signal queue closed, reader stopped");
            return;
        }
    }
}
