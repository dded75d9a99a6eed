#![doc = "reef-prover: 证明流水线的支撑工具。"]
#![doc = ""]
#![doc = "证明系统本体由外部证明库承担，本 crate 只承载流水线自有的少量"]
#![doc = "原创逻辑：FRI 承诺方案的域规约步长规划。"]

pub mod step_list;

pub use step_list::{StepPlanError, fri_round_count, generate_step_list, generate_step_list_default};
