//! The service wiring shared by one-shot commands and the shell.

use std::io::{self, Write};
use std::sync::Arc;

use items_core::{ItemClient, ItemService, NotificationLog, QueryConfig, Transport};

use crate::config::Config;
use crate::render;
use crate::transport::ReqwestTransport;

pub struct App<T> {
    service: ItemService<T>,
    notifications: Arc<NotificationLog>,
}

impl App<ReqwestTransport> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.base_url, ReqwestTransport::new(), config.query.clone())
    }
}

impl<T: Transport> App<T> {
    pub fn new(base_url: &str, transport: T, query: QueryConfig) -> Self {
        let notifications = Arc::new(NotificationLog::new());
        let service = ItemService::new(ItemClient::new(base_url), transport, query)
            .with_notifier(notifications.clone());
        Self {
            service,
            notifications,
        }
    }

    pub fn service(&self) -> &ItemService<T> {
        &self.service
    }

    /// Print and clear pending notifications. Returns how many were shown.
    pub fn flush_notifications<W: Write>(&self, out: &mut W) -> io::Result<usize> {
        let pending = self.notifications.drain();
        for notification in &pending {
            writeln!(out, "{}", render::notification(notification))?;
        }
        Ok(pending.len())
    }
}
