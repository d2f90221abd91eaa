//! オフライン送信キューの実装
//!
//! - `inmemory`: プロセス内のみ（テスト、キューファイル未指定時）
//! - `file`: JSON ファイルに永続化（クライアント再起動をまたいで保持）

pub mod file;
pub mod inmemory;

pub use file::FileOutboundQueue;
pub use inmemory::InMemoryOutboundQueue;
