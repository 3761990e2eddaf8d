//! ストリーミング音声認識 API ライブラリ
//!
//! 永続セッション越しの逐次文字起こしサーバ。クライアントはセッションを
//! 開始し、短い音声チャンクを繰り返しプッシュして途中仮説とレイテンシを
//! 受け取り、終了時に最終テキストを受け取る。
//!
//! - セッションは `session::StreamingCoordinator` が管理
//! - エンジンへのアクセスはプロセス全域で直列化（非リエントラント前提）
//! - HTTPハンドラは `handlers` モジュール

pub mod audio;
pub mod config;
pub mod engine;
pub mod handlers;
pub mod models;
pub mod session;
pub mod warmup;
