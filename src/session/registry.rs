//! セッションレジストリ
//!
//! 識別子→ストリームの対応表。レジストリ自身のロックはデコード直列化
//! リソースから独立しており、セッションの登録・削除が他セッションの
//! デコード待ちに巻き込まれることはない。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

pub struct SessionRegistry<S> {
    streams: RwLock<HashMap<String, Arc<Mutex<S>>>>,
}

impl<S> SessionRegistry<S> {
    pub fn new() -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
        }
    }

    /// 新しいエントリを登録
    pub fn insert(&self, session_id: String, stream: S) {
        self.streams
            .write()
            .insert(session_id, Arc::new(Mutex::new(stream)));
    }

    /// 参照のみの取得（削除しない）
    pub fn lookup(&self, session_id: &str) -> Option<Arc<Mutex<S>>> {
        self.streams.read().get(session_id).cloned()
    }

    /// アトミックに取り外して返す
    ///
    /// end がこれを使うことで、同一セッションの二重終了や、終了処理と
    /// 競合するプッシュがレジストリ視点で中途半端な状態を観測することを
    /// 防いでいる。
    pub fn remove(&self, session_id: &str) -> Option<Arc<Mutex<S>>> {
        self.streams.write().remove(session_id)
    }

    /// 現在アクティブなセッション数
    pub fn active_count(&self) -> usize {
        self.streams.read().len()
    }
}

impl<S> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
