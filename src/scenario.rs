use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{AgentKinematics, EPSILON, ScenarioParameters, VERIFY_TOLERANCE};

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

/// エージェント初期状態
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct AgentConfig {
    pub distance_m: f64,
    pub velocity_mps: f64,
    #[serde(default)]
    pub acceleration_mps2: f64,
}

impl AgentConfig {
    pub fn to_kinematics(&self) -> AgentKinematics {
        AgentKinematics::new(self.distance_m, self.velocity_mps, self.acceleration_mps2)
    }
}

/// 時間設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    pub headway_s: f64,
    /// 省略時は両エージェントの等速到達時刻の平均
    #[serde(default)]
    pub horizon_s: Option<f64>,
}

/// 重みスイープ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweepConfig {
    pub weights: Vec<f64>,
}

/// ソルバー設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolverConfig {
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_verify_tolerance")]
    pub verify_tolerance: f64,
}

fn default_epsilon() -> f64 {
    EPSILON
}

fn default_verify_tolerance() -> f64 {
    VERIFY_TOLERANCE
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            epsilon: EPSILON,
            verify_tolerance: VERIFY_TOLERANCE,
        }
    }
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub ego: AgentConfig,
    pub obstacle: AgentConfig,
    pub timing: TimingConfig,
    pub sweep: SweepConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// 組み込みの交差シナリオ
    ///
    /// 自車・障害物ともに30m手前を8m/sで接近し、車間時間1秒を要求します。
    pub fn cross_default() -> Self {
        Self {
            meta: ScenarioMeta {
                version: "1.0".to_string(),
                name: "cross_default".to_string(),
                description: "Symmetric crossing: both agents 30 m out at 8 m/s".to_string(),
            },
            ego: AgentConfig {
                distance_m: 30.0,
                velocity_mps: 8.0,
                acceleration_mps2: 0.0,
            },
            obstacle: AgentConfig {
                distance_m: 30.0,
                velocity_mps: 8.0,
                acceleration_mps2: 0.0,
            },
            timing: TimingConfig {
                headway_s: 1.0,
                horizon_s: None,
            },
            sweep: SweepConfig {
                weights: vec![0.0, 0.25, 0.5, 1.0],
            },
            solver: SolverConfig::default(),
        }
    }

    /// 設定の基本的な検証
    ///
    /// 負の重みや非正の地平時刻はここでは弾かず、割り当て器の失敗として扱います。
    pub fn validate(&self) -> Result<(), ScenarioError> {
        for (label, agent) in [("ego", &self.ego), ("obstacle", &self.obstacle)] {
            if !(agent.distance_m.is_finite()
                && agent.velocity_mps.is_finite()
                && agent.acceleration_mps2.is_finite())
            {
                return Err(ScenarioError::ValidationError(format!(
                    "{} kinematics must be finite",
                    label
                )));
            }
        }

        if !self.timing.headway_s.is_finite() {
            return Err(ScenarioError::ValidationError(
                "headway_s must be finite".to_string(),
            ));
        }
        if !self.time_horizon().is_finite() {
            return Err(ScenarioError::ValidationError(
                "horizon_s must be finite".to_string(),
            ));
        }

        if self.sweep.weights.is_empty() {
            return Err(ScenarioError::ValidationError(
                "sweep.weights must not be empty".to_string(),
            ));
        }
        if let Some(w) = self.sweep.weights.iter().find(|w| !w.is_finite()) {
            return Err(ScenarioError::ValidationError(format!(
                "weight {} is not finite",
                w
            )));
        }

        if self.solver.epsilon <= 0.0 || self.solver.verify_tolerance <= 0.0 {
            return Err(ScenarioError::ValidationError(
                "solver epsilon and verify_tolerance must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// 評価時刻（明示されていなければ到達時刻の平均から算出）
    pub fn time_horizon(&self) -> f64 {
        self.timing.horizon_s.unwrap_or_else(|| {
            let t_ego = self.ego.to_kinematics().naive_arrival_time();
            let t_obs = self.obstacle.to_kinematics().naive_arrival_time();
            (t_ego + t_obs) / 2.0
        })
    }

    /// 指定した重みでの割り当てパラメータ
    pub fn parameters(&self, obstacle_cost_weight: f64) -> ScenarioParameters {
        ScenarioParameters::new(
            self.time_horizon(),
            self.timing.headway_s,
            obstacle_cost_weight,
        )
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== Scenario ===");
        println!("Name:        {}", self.meta.name);
        println!("Description: {}", self.meta.description);
        println!("Version:     {}", self.meta.version);
        println!();

        println!(
            "Ego: d={} m, v={} m/s, a={} m/s²",
            self.ego.distance_m, self.ego.velocity_mps, self.ego.acceleration_mps2
        );
        println!(
            "Obs: d={} m, v={} m/s, a={} m/s²",
            self.obstacle.distance_m, self.obstacle.velocity_mps, self.obstacle.acceleration_mps2
        );
        let source = if self.timing.horizon_s.is_some() {
            "explicit"
        } else {
            "mean arrival time"
        };
        println!(
            "t_c = {} s ({}), t_hw = {} s",
            self.time_horizon(),
            source,
            self.timing.headway_s
        );
        println!("Weights: {:?}", self.sweep.weights);
    }
}

/// コマンドラインの重みを解析（シナリオ検証と同じく非有限値は拒否）
pub fn parse_weight(s: &str) -> Result<f64, String> {
    let w: f64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid weight '{}': {}", s, e))?;
    if !w.is_finite() {
        return Err(format!("weight {} is not finite", w));
    }
    Ok(w)
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("failed to parse YAML {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),

    #[error("invalid scenario: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const CROSS_YAML: &str = r#"
meta:
  version: "1.0"
  name: cross
  description: test
ego:
  distance_m: 30.0
  velocity_mps: 8.0
obstacle:
  distance_m: 20.0
  velocity_mps: 10.0
  acceleration_mps2: -0.5
timing:
  headway_s: 1.0
sweep:
  weights: [0.0, 1.0]
"#;

    #[test]
    fn test_parse_defaults() {
        let config: ScenarioConfig = serde_yaml::from_str(CROSS_YAML).unwrap();
        config.validate().unwrap();

        assert_eq!(config.ego.acceleration_mps2, 0.0);
        assert_eq!(config.obstacle.acceleration_mps2, -0.5);
        assert_eq!(config.solver.epsilon, EPSILON);
        assert_eq!(config.solver.verify_tolerance, VERIFY_TOLERANCE);
        // (30/8 + 20/10) / 2
        assert_abs_diff_eq!(config.time_horizon(), 2.875, epsilon = 1e-12);
    }

    #[test]
    fn test_cross_default_horizon() {
        let config = ScenarioConfig::cross_default();
        config.validate().unwrap();
        assert_abs_diff_eq!(config.time_horizon(), 3.75, epsilon = 1e-12);

        let params = config.parameters(0.5);
        assert_eq!(params.headway_time, 1.0);
        assert_eq!(params.obstacle_cost_weight, 0.5);
    }

    #[test]
    fn test_explicit_horizon_wins() {
        let mut config = ScenarioConfig::cross_default();
        config.timing.horizon_s = Some(2.0);
        assert_eq!(config.time_horizon(), 2.0);
    }

    #[test]
    fn test_validation_rejects_empty_sweep() {
        let mut config = ScenarioConfig::cross_default();
        config.sweep.weights.clear();
        assert!(matches!(
            config.validate(),
            Err(ScenarioError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_keeps_negative_weight() {
        let mut config = ScenarioConfig::cross_default();
        config.sweep.weights = vec![-0.1];
        config.timing.horizon_s = Some(0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("0.25"), Ok(0.25));
        assert_eq!(parse_weight("-0.1"), Ok(-0.1));
        assert!(parse_weight("NaN").is_err());
        assert!(parse_weight("inf").is_err());
        assert!(parse_weight("heavy").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = ScenarioConfig::from_file("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }
}
