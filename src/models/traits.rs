use crate::models::{
    allocator::AllocationResult,
    common::{AgentKinematics, ScenarioParameters},
};

/// ジャーク割り当て器のインターフェース
///
/// 実装は状態を持たず、同じ入力に対して常に同じ結果を返すこと。
pub trait IAllocator {
    /// 自車と障害物のジャークの組を計算
    fn allocate(
        &self,
        ego: &AgentKinematics,
        obs: &AgentKinematics,
        params: &ScenarioParameters,
    ) -> AllocationResult;
}
