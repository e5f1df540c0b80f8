//! # Verification モジュール
//!
//! 割り当て結果を評価時刻の運動状態に代入し直し、安全不等式
//! `ego_remaining <= obs_safe_margin + tolerance` が成り立つかを確認します。
//! 判定は診断用であり、割り当て器の契約には含まれません。

use serde::Serialize;

use crate::models::{AgentKinematics, JerkPair, ScenarioParameters};

/// 評価時刻における安全制約の再評価結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConstraintCheck {
    pub traveled_ego: f64,
    pub traveled_obs: f64,
    pub obs_velocity_at_horizon: f64,
    /// 自車の衝突点までの残り距離（正なら未到達）
    pub ego_remaining: f64,
    /// 障害物の安全マージン（正なら安全）
    pub obs_safe_margin: f64,
    pub satisfied: bool,
}

impl ConstraintCheck {
    pub fn evaluate(
        ego: &AgentKinematics,
        obs: &AgentKinematics,
        params: &ScenarioParameters,
        jerks: &JerkPair,
        tolerance: f64,
    ) -> Self {
        let t = params.time_horizon;

        let traveled_ego = ego.traveled(t, jerks.jerk_ego);
        let traveled_obs = obs.traveled(t, jerks.jerk_obs);
        let obs_velocity_at_horizon = obs.velocity_at(t, jerks.jerk_obs);

        let ego_remaining = ego.remaining_at(t, jerks.jerk_ego);
        let obs_safe_margin =
            obs.remaining_at(t, jerks.jerk_obs) - obs_velocity_at_horizon * params.headway_time;

        Self {
            traveled_ego,
            traveled_obs,
            obs_velocity_at_horizon,
            ego_remaining,
            obs_safe_margin,
            satisfied: ego_remaining <= obs_safe_margin + tolerance,
        }
    }

    /// `ego_remaining - obs_safe_margin`（等式解では0）
    pub fn gap(&self) -> f64 {
        self.ego_remaining - self.obs_safe_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VERIFY_TOLERANCE;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_jerk_symmetric_state_violates_headway() {
        let agent = AgentKinematics::new(30.0, 8.0, 0.0);
        let params = ScenarioParameters::new(3.75, 1.0, 1.0);
        let check = ConstraintCheck::evaluate(
            &agent,
            &agent,
            &params,
            &JerkPair::default(),
            VERIFY_TOLERANCE,
        );

        assert_abs_diff_eq!(check.ego_remaining, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(check.obs_safe_margin, -8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(check.gap(), 8.0, epsilon = 1e-12);
        assert!(!check.satisfied);
    }

    #[test]
    fn test_remaining_matches_agent_helper() {
        let ego = AgentKinematics::new(25.0, 7.0, 0.5);
        let obs = AgentKinematics::new(40.0, 10.0, -1.0);
        let params = ScenarioParameters::new(2.0, 1.5, 1.0);
        let jerks = JerkPair::new(0.3, -0.2);
        let check = ConstraintCheck::evaluate(&ego, &obs, &params, &jerks, VERIFY_TOLERANCE);

        assert_eq!(check.ego_remaining, ego.remaining_at(2.0, 0.3));
        assert_abs_diff_eq!(
            check.obs_safe_margin,
            obs.remaining_at(2.0, -0.2) - obs.velocity_at(2.0, -0.2) * 1.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_tolerance_admits_small_gap() {
        let ego = AgentKinematics::new(10.0005, 0.0, 0.0);
        let obs = AgentKinematics::new(10.0, 0.0, 0.0);
        let params = ScenarioParameters::new(1.0, 0.0, 1.0);
        let jerks = JerkPair::default();

        assert!(ConstraintCheck::evaluate(&ego, &obs, &params, &jerks, 1e-3).satisfied);
        assert!(!ConstraintCheck::evaluate(&ego, &obs, &params, &jerks, 1e-4).satisfied);
    }
}
