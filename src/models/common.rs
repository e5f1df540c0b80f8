use serde::{Deserialize, Serialize};

/// 地平時刻・係数の退化判定に用いる閾値
pub const EPSILON: f64 = 1e-9;

/// 事後検証で安全条件を判定する際の許容誤差（メートル）
pub const VERIFY_TOLERANCE: f64 = 1e-3;

/// 到達時刻の概算で速度をこの値以上にクリップする（m/s）
pub const MIN_ARRIVAL_SPEED: f64 = 0.1;

/// 計画時点における1エージェントの運動状態
///
/// 符号の制約はありません（減速中のエージェントも表現できます）。
/// `distance_to_conflict_point` は慣例的に非負ですが検証はしません。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentKinematics {
    /// 交差点（衝突点）までの距離（m）
    pub distance_to_conflict_point: f64,
    /// 速度（m/s）
    pub velocity: f64,
    /// 加速度（m/s²）
    pub acceleration: f64,
}

impl AgentKinematics {
    pub fn new(distance_to_conflict_point: f64, velocity: f64, acceleration: f64) -> Self {
        Self {
            distance_to_conflict_point,
            velocity,
            acceleration,
        }
    }

    /// 一定ジャーク `jerk` の下で時間 `t` に進む距離
    ///
    /// `v·t + a·t²/2 + j·t³/6`
    pub fn traveled(&self, t: f64, jerk: f64) -> f64 {
        let t2 = t * t;
        self.velocity * t + 0.5 * self.acceleration * t2 + jerk * t2 * t / 6.0
    }

    /// 一定ジャーク `jerk` の下での時刻 `t` の速度
    pub fn velocity_at(&self, t: f64, jerk: f64) -> f64 {
        self.velocity + self.acceleration * t + 0.5 * jerk * t * t
    }

    /// 時刻 `t` における衝突点までの残り距離
    pub fn remaining_at(&self, t: f64, jerk: f64) -> f64 {
        self.distance_to_conflict_point - self.traveled(t, jerk)
    }

    /// 等速を仮定した衝突点への到達時刻の概算
    pub fn naive_arrival_time(&self) -> f64 {
        self.distance_to_conflict_point / self.velocity.max(MIN_ARRIVAL_SPEED)
    }
}

/// 1回の割り当て計算に与えるパラメータ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    /// 評価時刻 t_c（s、正であること）
    pub time_horizon: f64,
    /// 車間時間 t_hw（s）
    pub headway_time: f64,
    /// 障害物側ジャークのコスト重み w_agent（非負であること）
    pub obstacle_cost_weight: f64,
}

impl ScenarioParameters {
    pub fn new(time_horizon: f64, headway_time: f64, obstacle_cost_weight: f64) -> Self {
        Self {
            time_horizon,
            headway_time,
            obstacle_cost_weight,
        }
    }

    /// 重みだけを差し替えたコピー
    pub fn with_weight(self, obstacle_cost_weight: f64) -> Self {
        Self {
            obstacle_cost_weight,
            ..self
        }
    }
}

/// 2エージェント分のジャーク（m/s³）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JerkPair {
    pub jerk_ego: f64,
    pub jerk_obs: f64,
}

impl JerkPair {
    pub fn new(jerk_ego: f64, jerk_obs: f64) -> Self {
        Self { jerk_ego, jerk_obs }
    }

    /// 二次コスト `j_ego² + w·j_obs²`
    pub fn cost(&self, obstacle_cost_weight: f64) -> f64 {
        self.jerk_ego * self.jerk_ego + obstacle_cost_weight * self.jerk_obs * self.jerk_obs
    }
}
