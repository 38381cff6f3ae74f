//! locale-sync
//!
//! ソースロケールの JSON を基準に、各ロケールの翻訳ファイルを差分だけ LLM で翻訳して同期する

/// 設定ファイルの型と読み込み
pub mod config;
/// JSON ツリーの構造差分
pub mod diff;
/// ロケールドキュメントの型と JSON パース
pub mod document;
/// `init` サブコマンド
pub mod init;
/// ロケールタグ
pub mod locale;
/// tracing の初期化
pub mod logging;
/// 翻訳結果の合成と削除の反映
pub mod merge;
/// ソースと出力の保存先
pub mod persistence;
/// トークン予算とバッチ分割
pub mod planner;
/// プロバイダーに送るプロンプト
pub mod prompt;
/// 翻訳バックエンド
pub mod provider;
/// ロケールドキュメントの形の導出と検証
pub mod schema;
/// 同期処理本体
pub mod sync;

/// テスト用ヘルパー
#[cfg(test)]
mod test_utils;

pub use sync::{
    SyncEngine,
    SyncError,
    SyncReport,
};
