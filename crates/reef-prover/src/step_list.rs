use rand::Rng;

/// 步长规划的失败分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StepPlanError {
    /// 单步上限必须为正数，否则无法覆盖任何规约轮次。
    #[error("max_step 必须为正数")]
    ZeroMaxStep,
}

/// 把 `r` 轮域规约随机拆分为若干步，每步折叠 `1..=max_step` 轮。
///
/// # 设计背景（Why）
/// - FRI 承诺方案在证明与验证开销之间的权衡由每步折叠的轮数决定；
///   随机化步长让同一电路的多次证明呈现不同的折叠剖面。
///
/// # 逻辑解析（How）
/// - 剩余轮次多于 `max_step` 时随机取一步；
/// - 进入收尾区间后退化为确定性尾序列：先补 `剩余 - 1`，再以恒定的
///   末步 `1` 收口。
///
/// # 契约说明（What）
/// - 返回序列之和恰为 `r`，每步都落在 `[1, max_step]`；
/// - `r == 0` 得到空序列；`max_step == 1` 得到全 1 序列；
/// - `r > 0` 时末步恒为 `1`；
/// - `max_step == 0` 返回 [`StepPlanError::ZeroMaxStep`]。
pub fn generate_step_list<R: Rng + ?Sized>(
    r: usize,
    max_step: usize,
    rng: &mut R,
) -> Result<Vec<usize>, StepPlanError> {
    if max_step == 0 {
        return Err(StepPlanError::ZeroMaxStep);
    }
    let mut step_list = Vec::new();
    let mut steps_sum = 0;
    while steps_sum != r {
        if r - steps_sum <= max_step {
            while r - steps_sum != 1 {
                let step = r - steps_sum - 1;
                step_list.push(step);
                steps_sum += step;
            }
            step_list.push(1);
            steps_sum += 1;
        } else {
            let step = rng.gen_range(1..=max_step);
            step_list.push(step);
            steps_sum += step;
        }
    }
    Ok(step_list)
}

/// 以线程本地随机源规划步长。
pub fn generate_step_list_default(r: usize, max_step: usize) -> Result<Vec<usize>, StepPlanError> {
    generate_step_list(r, max_step, &mut rand::thread_rng())
}

/// 由赋值表行数的对数推出规约轮数（域大小规划的输入）。
pub fn fri_round_count(table_rows_log: usize) -> usize {
    table_rows_log.saturating_sub(1)
}
