//! Credential store implementations.
//!
//! - `memory`: プロセス内で保持する実装（テスト・組み込み用）
//! - `file`: JSON ファイルをクライアントストレージとして読む実装

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
