use std::sync::Arc;

use tokio::{spawn, sync::mpsc::Receiver};
use tracing::{debug, info};

use crate::{
	handlers::Framework,
	host::{ChatHost, InboundMessage},
};

/// Pumps inbound messages into the framework, one task per message, until the host hangs up
pub async fn handle_inbound(
	framework: Arc<Framework>,
	host: Arc<dyn ChatHost>,
	mut inbound: Receiver<InboundMessage>,
) {
	while let Some(message) = inbound.recv().await {
		debug!(
			"Message {} in {} from {}",
			message.id, message.chat, message.sender
		);
		let framework = Arc::clone(&framework);
		let host = Arc::clone(&host);
		spawn(async move {
			framework.dispatch(host, message).await;
		});
	}
	info!("Inbound channel closed");
}
