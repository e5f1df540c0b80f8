//! # jerkalloc
//!
//! 衝突点に接近する2エージェント（自車と障害物）について、評価時刻での
//! 安全マージン制約を等号で満たす最小コストのジャークの組を閉形式で求めます。
//!
//! - [`models`]: 割り当て器本体と運動学の値型
//! - [`verification`]: 結果を運動状態に代入し直す事後検証
//! - [`scenario`] / [`sweep`]: YAMLシナリオと重みスイープのハーネス
//! - [`logging`]: tracing の初期化

pub mod logging;
pub mod models;
pub mod scenario;
pub mod sweep;
pub mod verification;

pub use models::{
    AgentKinematics, AllocationFailure, AllocationResult, IAllocator, JerkAllocator, JerkPair,
    ScenarioParameters, compute_optimal_jerks_cross,
};
