// 範囲単位の画像合成
//
// - compositing/range.rs   - (開始, 終了)の解決
// - compositing/engine.rs  - 1範囲の合成と書き出し
// - compositing/job.rs     - 複数範囲のジョブ実行

pub mod engine;
pub mod job;
pub mod range;

pub use engine::{CompositingEngine, MergeFailure};
pub use job::{failure_pairs, process_range, MergeJob, MERGE_INPUT_FORMATS};
pub use range::resolve_range;
