// 基本的なデータ型と運動学ユーティリティ
pub mod common;

// 割り当て器のインターフェース（trait）定義
pub mod traits;

// 閉形式のジャーク割り当て
pub mod allocator;

// 便利な re-export
pub use allocator::{
    AllocationFailure, AllocationResult, ConstraintCoefficients, JerkAllocator,
    compute_optimal_jerks_cross,
};
pub use common::*;
pub use traits::*;
