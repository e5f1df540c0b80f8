//! # Sweep モジュール
//!
//! シナリオに記述された重みの列について割り当て器を1回ずつ呼び出し、
//! 結果と事後検証をまとめるハーネスです。
//!
//! 割り当て器自体は純粋関数であり、ここでの状態はスイープの入力と
//! 集計結果のみです。
//!
//! ## 使用例
//!
//! ```rust
//! use jerkalloc::scenario::ScenarioConfig;
//! use jerkalloc::sweep::SweepRunner;
//!
//! let config = ScenarioConfig::cross_default();
//! let report = SweepRunner::new(config, 0).run();
//! assert_eq!(report.entries.len(), 4);
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::*;
use crate::scenario::ScenarioConfig;
use crate::verification::ConstraintCheck;

/// 1つの重みに対する結果
#[derive(Debug, Clone, Serialize)]
pub struct SweepEntry {
    pub obstacle_cost_weight: f64,
    pub result: AllocationResult,
    /// 失敗理由（成功時は None）
    pub failure: Option<String>,
    pub cost: Option<f64>,
    pub check: Option<ConstraintCheck>,
}

/// スイープ全体の結果
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub scenario: String,
    pub time_horizon: f64,
    pub headway_time: f64,
    pub coefficients: ConstraintCoefficients,
    pub entries: Vec<SweepEntry>,
}

impl SweepReport {
    pub fn successes(&self) -> usize {
        self.entries.iter().filter(|e| e.result.success).count()
    }

    /// 事後検証を通らなかった成功結果の数
    pub fn violations(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.check.is_some_and(|c| !c.satisfied))
            .count()
    }

    /// 元のハーネスと同じ形式でコンソールに表示
    pub fn print(&self) {
        for entry in &self.entries {
            println!("w_agent = {}", entry.obstacle_cost_weight);
            match (entry.result.jerks(), entry.check) {
                (Some(jerks), Some(check)) => {
                    println!("  jerk_ego = {} m/s³", jerks.jerk_ego);
                    println!("  jerk_obs = {} m/s³", jerks.jerk_obs);
                    println!("  Ego remaining to CP: {} m", check.ego_remaining);
                    println!("  Obs safe margin:     {} m", check.obs_safe_margin);
                    println!(
                        "  Constraint satisfied? {}",
                        if check.satisfied { "YES" } else { "NO" }
                    );
                }
                _ => println!("  Failed to solve."),
            }
            println!("-------------------");
        }
    }
}

pub struct SweepRunner {
    pub allocator: JerkAllocator,
    pub ego: AgentKinematics,
    pub obstacle: AgentKinematics,
    pub weights: Vec<f64>,
    pub verify_tolerance: f64,
    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,
}

impl SweepRunner {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        Self {
            allocator: JerkAllocator::new(scenario.solver.epsilon),
            ego: scenario.ego.to_kinematics(),
            obstacle: scenario.obstacle.to_kinematics(),
            weights: scenario.sweep.weights.clone(),
            verify_tolerance: scenario.solver.verify_tolerance,
            scenario_config: scenario,
            verbose_level,
        }
    }

    /// スイープする重みを差し替え
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = weights;
        self
    }

    pub fn run(&self) -> SweepReport {
        let base = self.scenario_config.parameters(0.0);
        let coefficients = ConstraintCoefficients::from_state(
            &self.ego,
            &self.obstacle,
            base.time_horizon,
            base.headway_time,
        );

        info!(
            scenario = %self.scenario_config.meta.name,
            t_c = base.time_horizon,
            t_hw = base.headway_time,
            weights = self.weights.len(),
            "スイープ開始"
        );
        if self.verbose_level > 1 {
            debug!(
                a = coefficients.a,
                b = coefficients.b,
                c = coefficients.c,
                "制約係数"
            );
        }
        if coefficients.satisfied_without_jerk() {
            info!(slack = coefficients.c, "ジャーク0で安全条件は既に成立（等式解に引き寄せられます）");
        }

        let entries: Vec<SweepEntry> = self
            .weights
            .iter()
            .map(|&w| self.evaluate(base.with_weight(w)))
            .collect();

        let report = SweepReport {
            scenario: self.scenario_config.meta.name.clone(),
            time_horizon: base.time_horizon,
            headway_time: base.headway_time,
            coefficients,
            entries,
        };

        info!(
            successes = report.successes(),
            violations = report.violations(),
            "スイープ完了"
        );

        report
    }

    fn evaluate(&self, params: ScenarioParameters) -> SweepEntry {
        let w = params.obstacle_cost_weight;

        match self.allocator.try_allocate(&self.ego, &self.obstacle, &params) {
            Ok(jerks) => {
                let check = ConstraintCheck::evaluate(
                    &self.ego,
                    &self.obstacle,
                    &params,
                    &jerks,
                    self.verify_tolerance,
                );

                info!(
                    w_agent = w,
                    jerk_ego = jerks.jerk_ego,
                    jerk_obs = jerks.jerk_obs,
                    "割り当て成功"
                );
                if !check.satisfied {
                    warn!(w_agent = w, gap = check.gap(), "事後検証で安全条件を満たしていません");
                }

                SweepEntry {
                    obstacle_cost_weight: w,
                    result: AllocationResult::succeeded(jerks),
                    failure: None,
                    cost: Some(jerks.cost(w)),
                    check: Some(check),
                }
            }
            Err(failure) => {
                warn!(w_agent = w, reason = %failure, "割り当て失敗");
                SweepEntry {
                    obstacle_cost_weight: w,
                    result: AllocationResult::failed(),
                    failure: Some(failure.to_string()),
                    cost: None,
                    check: None,
                }
            }
        }
    }
}
