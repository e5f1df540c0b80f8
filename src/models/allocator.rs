use serde::Serialize;
use thiserror::Error;

use crate::models::{
    common::{AgentKinematics, EPSILON, JerkPair, ScenarioParameters},
    traits::IAllocator,
};

/// 安全マージン制約を1本の線形等式 `A·j_ego + B·j_obs = C` に整理した係数
///
/// 制約は評価時刻 t において
///
/// ```text
/// d_ego - traveled_ego(t) <= d_obs - traveled_obs(t) - v_obs(t)·hw
/// ```
///
/// であり、最適解では等号で成立するものとして扱います。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConstraintCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl ConstraintCoefficients {
    pub fn from_state(
        ego: &AgentKinematics,
        obs: &AgentKinematics,
        time_horizon: f64,
        headway_time: f64,
    ) -> Self {
        let t = time_horizon;
        let hw = headway_time;
        let t2 = t * t;

        // ジャーク → 移動距離 / 終端速度
        let k = t2 * t / 6.0;
        let kv = 0.5 * t2;

        let trav_ego_const = ego.velocity * t + 0.5 * ego.acceleration * t2;
        let trav_obs_const = obs.velocity * t + 0.5 * obs.acceleration * t2;
        let v_obs_const = obs.velocity + obs.acceleration * t;

        Self {
            a: -k,
            b: k + kv * hw,
            c: (obs.distance_to_conflict_point - ego.distance_to_conflict_point)
                - (trav_obs_const - trav_ego_const)
                - v_obs_const * hw,
        }
    }

    /// `A·j_ego + B·j_obs - C`
    pub fn residual(&self, jerks: &JerkPair) -> f64 {
        self.a * jerks.jerk_ego + self.b * jerks.jerk_obs - self.c
    }

    /// ジャーク0のままで安全不等式が満たされているか
    pub fn satisfied_without_jerk(&self) -> bool {
        self.c >= 0.0
    }
}

/// 割り当て失敗の理由（いずれも入力が不適切であることを示す）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocationFailure {
    #[error("time horizon is not positive")]
    NonPositiveHorizon,

    #[error("obstacle cost weight is negative")]
    NegativeWeight,

    #[error("obstacle jerk has no leverage on the constraint")]
    NoObstacleLeverage,

    #[error("constraint coefficients are degenerate")]
    DegenerateConstraint,
}

/// 割り当て結果
///
/// `success` が偽のときジャークは0.0が入りますが、意味を持ちません。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AllocationResult {
    pub success: bool,
    pub jerk_ego: f64,
    pub jerk_obs: f64,
}

impl AllocationResult {
    pub fn failed() -> Self {
        Self {
            success: false,
            jerk_ego: 0.0,
            jerk_obs: 0.0,
        }
    }

    pub fn succeeded(jerks: JerkPair) -> Self {
        Self {
            success: true,
            jerk_ego: jerks.jerk_ego,
            jerk_obs: jerks.jerk_obs,
        }
    }

    /// 成功時のみジャークの組を返す
    pub fn jerks(&self) -> Option<JerkPair> {
        self.success
            .then(|| JerkPair::new(self.jerk_ego, self.jerk_obs))
    }
}

impl From<Result<JerkPair, AllocationFailure>> for AllocationResult {
    fn from(result: Result<JerkPair, AllocationFailure>) -> Self {
        match result {
            Ok(jerks) => Self::succeeded(jerks),
            Err(_) => Self::failed(),
        }
    }
}

/// 交差シナリオのジャーク割り当て器
///
/// `min j_ego² + w·j_obs²  s.t.  A·j_ego + B·j_obs = C` をラグランジュ乗数で
/// 閉形式に解きます。状態を持たない純粋関数です。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JerkAllocator {
    /// 退化判定の閾値
    pub epsilon: f64,
}

impl Default for JerkAllocator {
    fn default() -> Self {
        Self { epsilon: EPSILON }
    }
}

impl JerkAllocator {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn try_allocate(
        &self,
        ego: &AgentKinematics,
        obs: &AgentKinematics,
        params: &ScenarioParameters,
    ) -> Result<JerkPair, AllocationFailure> {
        let eps = self.epsilon;
        let w = params.obstacle_cost_weight;

        if params.time_horizon <= eps {
            return Err(AllocationFailure::NonPositiveHorizon);
        }
        if w < 0.0 {
            return Err(AllocationFailure::NegativeWeight);
        }

        let coeffs =
            ConstraintCoefficients::from_state(ego, obs, params.time_horizon, params.headway_time);
        let ConstraintCoefficients { a, b, c } = coeffs;

        // 障害物側のコストが実質0: 修正量をすべて障害物が負担
        if w < eps {
            if b.abs() < eps {
                return Err(AllocationFailure::NoObstacleLeverage);
            }
            return Ok(JerkPair::new(0.0, c / b));
        }

        let denom = a * a + (b * b) / w;
        if denom.abs() < eps {
            return Err(AllocationFailure::DegenerateConstraint);
        }

        let lambda = 2.0 * c / denom;
        Ok(JerkPair::new(lambda * a / 2.0, lambda * b / (2.0 * w)))
    }
}

impl IAllocator for JerkAllocator {
    fn allocate(
        &self,
        ego: &AgentKinematics,
        obs: &AgentKinematics,
        params: &ScenarioParameters,
    ) -> AllocationResult {
        self.try_allocate(ego, obs, params).into()
    }
}

/// 9個のスカラー入力を直接受け取る平坦なインターフェース
#[allow(clippy::too_many_arguments)]
pub fn compute_optimal_jerks_cross(
    d_ego: f64,
    v_ego: f64,
    a_ego: f64,
    d_obs: f64,
    v_obs: f64,
    a_obs: f64,
    t_c: f64,
    t_hw: f64,
    w_agent: f64,
) -> AllocationResult {
    JerkAllocator::default().allocate(
        &AgentKinematics::new(d_ego, v_ego, a_ego),
        &AgentKinematics::new(d_obs, v_obs, a_obs),
        &ScenarioParameters::new(t_c, t_hw, w_agent),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cross_state() -> (AgentKinematics, AgentKinematics) {
        (
            AgentKinematics::new(30.0, 8.0, 0.0),
            AgentKinematics::new(30.0, 8.0, 0.0),
        )
    }

    #[test]
    fn test_coefficients_cross_scenario() {
        let (ego, obs) = cross_state();
        let coeffs = ConstraintCoefficients::from_state(&ego, &obs, 3.75, 1.0);

        let k = 3.75_f64.powi(3) / 6.0;
        assert_abs_diff_eq!(coeffs.a, -k, epsilon = 1e-12);
        assert_abs_diff_eq!(coeffs.b, k + 0.5 * 3.75 * 3.75, epsilon = 1e-12);
        // 同一状態なので定数項は車間バッファ分のみ
        assert_abs_diff_eq!(coeffs.c, -8.0, epsilon = 1e-12);
        assert!(!coeffs.satisfied_without_jerk());
    }

    #[test]
    fn test_failure_reasons() {
        let (ego, obs) = cross_state();
        let allocator = JerkAllocator::default();

        let zero_horizon = ScenarioParameters::new(0.0, 1.0, 1.0);
        assert_eq!(
            allocator.try_allocate(&ego, &obs, &zero_horizon),
            Err(AllocationFailure::NonPositiveHorizon)
        );

        let negative = ScenarioParameters::new(3.75, 1.0, -0.1);
        assert_eq!(
            allocator.try_allocate(&ego, &obs, &negative),
            Err(AllocationFailure::NegativeWeight)
        );
    }

    #[test]
    fn test_horizon_checked_before_weight() {
        let (ego, obs) = cross_state();
        let params = ScenarioParameters::new(-1.0, 1.0, -0.1);
        assert_eq!(
            JerkAllocator::default().try_allocate(&ego, &obs, &params),
            Err(AllocationFailure::NonPositiveHorizon)
        );
    }

    #[test]
    fn test_no_obstacle_leverage() {
        // B = K + Kv·hw = 0 となる車間時間 hw = -t/3
        let (ego, obs) = cross_state();
        let params = ScenarioParameters::new(3.0, -1.0, 0.0);
        assert_eq!(
            JerkAllocator::default().try_allocate(&ego, &obs, &params),
            Err(AllocationFailure::NoObstacleLeverage)
        );
    }

    #[test]
    fn test_degenerate_denominator() {
        // 極小の地平時刻では A² + B²/w が閾値を下回る
        let allocator = JerkAllocator::new(1e-9);
        let (ego, obs) = cross_state();
        let params = ScenarioParameters::new(1e-3, 0.0, 1.0);
        assert_eq!(
            allocator.try_allocate(&ego, &obs, &params),
            Err(AllocationFailure::DegenerateConstraint)
        );
    }

    #[test]
    fn test_result_failed_has_no_jerks() {
        let result = compute_optimal_jerks_cross(30.0, 8.0, 0.0, 30.0, 8.0, 0.0, 0.0, 1.0, 1.0);
        assert!(!result.success);
        assert_eq!(result.jerks(), None);
    }

    #[test]
    fn test_residual_zero_at_solution() {
        let (ego, obs) = cross_state();
        let params = ScenarioParameters::new(3.75, 1.0, 0.5);
        let jerks = JerkAllocator::default()
            .try_allocate(&ego, &obs, &params)
            .unwrap();
        let coeffs = ConstraintCoefficients::from_state(&ego, &obs, 3.75, 1.0);
        assert_abs_diff_eq!(coeffs.residual(&jerks), 0.0, epsilon = 1e-12);
    }
}
