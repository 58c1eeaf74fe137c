//! Application startup and component wiring
//!
//! Every component receives its collaborators explicitly; there is no
//! ambient service registry. The binary speaks the protocol as JSON lines
//! on stdin/stdout, which keeps transport plumbing out of the core.

use crate::app::args::Args;
use crate::core::config::DeviceConfig;
use crate::core::logging::init_logging;
use crate::notifications::delivery::{HttpSignalTransport, SignalTransport};
use crate::notifications::dispatcher::NotificationDispatcher;
use crate::notifications::subscription::SubscriptionRegistry;
use crate::protocol::codes;
use crate::protocol::dispatcher::ProtocolDispatcher;
use crate::protocol::message::{Message, MessageFactory, MessageKind};
use crate::protocol::processors::{
    AbortQueueEntryProcessor, QueueControlOp, QueueControlProcessor, QueueStatusProcessor,
    RemoveQueueEntryProcessor, StopPersistentChannelProcessor, SubmitQueueEntryProcessor,
};
use crate::protocol::worker::{SubmitWorkerHandle, SubmitWorkerPool};
use crate::queue::engine::QueueEngine;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;

/// Initialize the application and run until stdin closes or SIGINT
pub fn startup() -> i32 {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match DeviceConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("presswork: {e}");
                return 1;
            }
        },
        None => DeviceConfig::default(),
    };
    if let Some(capacity) = args.capacity {
        config.queue.capacity = capacity;
    }
    if let Some(workers) = args.workers {
        config.workers.count = workers;
    }

    let level = args.log_level.as_deref().or(config.log.level.as_deref());
    let file = args.log_file.as_deref().or(config.log.file.as_deref());
    if let Err(e) = init_logging(level, file) {
        eprintln!("presswork: logging initialisation failed: {e}");
        return 1;
    }

    log::info!(
        "presswork starting (queue capacity {}, {} submission worker(s))",
        config.queue.capacity,
        config.workers.count
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("tokio runtime initialisation failed: {e}");
            return 1;
        }
    };
    runtime.block_on(run(config))
}

/// Register every protocol processor against one dispatcher
pub fn build_dispatcher(
    engine: &Arc<QueueEngine>,
    registry: &Arc<SubscriptionRegistry>,
    ids: &Arc<MessageFactory>,
    workers: Option<SubmitWorkerHandle>,
) -> ProtocolDispatcher {
    let mut dispatcher = ProtocolDispatcher::new(Arc::clone(registry), Arc::clone(ids));
    dispatcher.register(Arc::new(SubmitQueueEntryProcessor::new(
        Arc::clone(engine),
        Arc::clone(ids),
        workers,
    )));
    dispatcher.register(Arc::new(RemoveQueueEntryProcessor::new(
        Arc::clone(engine),
        Arc::clone(ids),
    )));
    dispatcher.register(Arc::new(AbortQueueEntryProcessor::new(
        Arc::clone(engine),
        Arc::clone(ids),
    )));
    for op in [
        QueueControlOp::Hold,
        QueueControlOp::Resume,
        QueueControlOp::Open,
        QueueControlOp::Close,
    ] {
        dispatcher.register(Arc::new(QueueControlProcessor::new(
            op,
            Arc::clone(engine),
            Arc::clone(ids),
        )));
    }
    dispatcher.register(Arc::new(QueueStatusProcessor::new(
        Arc::clone(engine),
        Arc::clone(ids),
    )));
    dispatcher.register(Arc::new(StopPersistentChannelProcessor::new(
        Arc::clone(registry),
        Arc::clone(ids),
    )));
    dispatcher
}

async fn run(config: DeviceConfig) -> i32 {
    let registry = Arc::new(SubscriptionRegistry::new(config.signal_map()));
    let transport: Arc<dyn SignalTransport> = Arc::new(HttpSignalTransport::new());
    let ids = Arc::new(MessageFactory::new("m"));

    let (events_tx, events_rx) = unbounded_channel();
    let engine = Arc::new(QueueEngine::new(config.queue.capacity, events_tx));

    let notifier = NotificationDispatcher::new(
        Arc::clone(&registry),
        Arc::clone(&transport),
        Arc::clone(&ids),
    )
    .spawn(events_rx);
    let workers = SubmitWorkerPool::start(
        config.workers.count,
        config.workers.backlog,
        Arc::clone(&engine),
        Arc::clone(&ids),
        Arc::clone(&transport),
    );

    let dispatcher = build_dispatcher(&engine, &registry, &ids, Some(workers.handle()));

    if let Err(e) = serve_stdio(&dispatcher, &ids).await {
        log::error!("message loop failed: {e}");
    }

    // Shutdown: stop accepting work, drain workers, then let the event
    // channel close so the notification dispatcher stops.
    log::info!("presswork shutting down");
    registry.clear();
    drop(dispatcher);
    workers.shutdown().await;
    drop(engine);
    if let Err(e) = notifier.await {
        log::warn!("notification dispatcher terminated abnormally: {e}");
    }
    0
}

/// JSON-lines protocol harness: one message per stdin line, one reply per
/// stdout line
async fn serve_stdio(
    dispatcher: &ProtocolDispatcher,
    ids: &MessageFactory,
) -> Result<(), std::io::Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break, // stdin closed
                };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = match serde_json::from_str::<Message>(&line) {
                    Ok(request) => dispatcher.dispatch(&request),
                    Err(e) => {
                        log::warn!("unparseable message: {e}");
                        let mut reply = Message::new(
                            ids.next_id(),
                            MessageKind::Response,
                            "Unknown".to_string(),
                        );
                        reply.return_code = Some(codes::RC_INVALID_PARAMETER);
                        reply.comments.push(format!("unparseable message: {e}"));
                        reply
                    }
                };
                let mut encoded = serde_json::to_string(&reply)
                    .unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"));
                encoded.push('\n');
                stdout.write_all(encoded.as_bytes()).await?;
                stdout.flush().await?;
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupt received");
                break;
            }
        }
    }
    Ok(())
}
