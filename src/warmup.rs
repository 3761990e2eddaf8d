//! ウォームアップタスク
//!
//! 起動直後に無音1秒をエンジンへ1回通し、初回リクエストのコールド
//! スタートコストを先払いする。完了は誰にも待たれず、結果も失敗も
//! 破棄される。クライアント向けの経路をブロックしてはならない。

use std::sync::Arc;

use tracing::debug;

use crate::engine::StreamingRecognizer;
use crate::session::StreamingCoordinator;

pub fn spawn_warmup<E: StreamingRecognizer>(
    coordinator: Arc<StreamingCoordinator<E>>,
    sample_rate: u32,
) {
    tokio::spawn(async move {
        match coordinator.warm_up(sample_rate).await {
            Ok(()) => debug!("engine warm-up complete"),
            Err(err) => debug!(error = %err, "engine warm-up failed (ignored)"),
        }
    });
}
