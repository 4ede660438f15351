use std::collections::{HashSet, VecDeque};

use crate::plan::{ExecutionPlan, ExecutionStep, StepStatus};
use crate::tools::ToolRegistry;
use crate::types::{ArgMap, StepCategory, ToolInvocation};

/// Argument keys the Planner inspects to find the file path a tool
/// invocation targets (§4.D).
const PATH_KEYS: &[&str] = &["path", "file", "fileName", "file_path", "target"];

fn extract_paths(args: &ArgMap) -> Vec<String> {
    PATH_KEYS
        .iter()
        .filter_map(|key| args.get(*key))
        .filter_map(|v| v.as_str())
        .map(|s| s.to_string())
        .collect()
}

fn is_make_dir(tool_name: &str) -> bool {
    let lower = tool_name.to_ascii_lowercase();
    lower.contains("mkdir") || lower.contains("make_dir") || lower.contains("makedir")
}

/// Builds [`ExecutionPlan`]s from a flat list of [`ToolInvocation`]s: infers
/// dependencies (§4.D rules 1-5), categorizes steps, and computes
/// parallel-safe groups. Stateless between calls — all state lives in the
/// plan it returns.
pub struct Planner {
    completion_tool: String,
}

impl Planner {
    pub fn new(completion_tool: impl Into<String>) -> Self {
        Self { completion_tool: completion_tool.into() }
    }

    /// A tool belongs to the closed sequential set if it is the completion
    /// tool or runs with [`StepCategory::Execution`] (an arbitrary shell
    /// command, by convention).
    pub fn is_sequential_tool(&self, registry: &ToolRegistry, tool_name: &str) -> bool {
        tool_name == self.completion_tool || self.categorize(registry, tool_name) == StepCategory::Execution
    }

    pub fn categorize(&self, registry: &ToolRegistry, tool_name: &str) -> StepCategory {
        if tool_name == self.completion_tool {
            return StepCategory::Completion;
        }
        if let Some(category) = registry.category_of(tool_name) {
            return category;
        }
        let lower = tool_name.to_ascii_lowercase();
        if lower.contains("read") || lower.contains("list") || lower.contains("search") || lower.contains("grep") {
            StepCategory::Analysis
        } else if lower.contains("write")
            || lower.contains("edit")
            || lower.contains("create")
            || lower.contains("delete")
            || lower.contains("apply")
            || is_make_dir(&lower)
        {
            StepCategory::Modification
        } else if lower.contains("test") || lower.contains("lint") || lower.contains("check") {
            StepCategory::Test
        } else if lower.contains("exec") || lower.contains("run") || lower.contains("shell") || lower.contains("command") {
            StepCategory::Execution
        } else {
            StepCategory::Other
        }
    }

    pub fn build_plan(&self, registry: &ToolRegistry, invocations: &[ToolInvocation]) -> ExecutionPlan {
        let mut steps: Vec<ExecutionStep> = Vec::with_capacity(invocations.len());

        for (idx, inv) in invocations.iter().enumerate() {
            let category = self.categorize(registry, &inv.name);
            let paths = extract_paths(&inv.args);
            let mut deps: HashSet<usize> = HashSet::new();

            match category {
                StepCategory::Modification => {
                    // Rule 1: depend on the most recent prior step that read or wrote the same path.
                    for path in &paths {
                        if let Some(dep) = most_recent_touch(&steps, path) {
                            deps.insert(dep);
                        }
                    }
                }
                StepCategory::Analysis => {
                    // Rule 2: depend on the most recent prior write to the same path.
                    for path in &paths {
                        if let Some(dep) = most_recent_write(&steps, path) {
                            deps.insert(dep);
                        }
                    }
                }
                StepCategory::Test => {
                    // Rule 3: depend on every prior write/modification step.
                    for step in &steps {
                        if step.category == StepCategory::Modification {
                            deps.insert(step.id);
                        }
                    }
                }
                _ => {}
            }

            // Rule 4: depend on an earlier make-dir step whose target prefixes this step's path.
            for step in &steps {
                if is_make_dir(&step.tool_name) {
                    if let Some(dir) = extract_paths(&step.args).first() {
                        if paths.iter().any(|p| p != dir && p.starts_with(dir.as_str())) {
                            deps.insert(step.id);
                        }
                    }
                }
            }

            // Rule 5: the completion step depends on every prior analysis/modification step.
            if inv.name == self.completion_tool {
                for step in &steps {
                    if matches!(step.category, StepCategory::Analysis | StepCategory::Modification) {
                        deps.insert(step.id);
                    }
                }
            }

            let mut step = ExecutionStep::new(idx, inv.name.clone(), inv.args.clone(), category);
            let mut deps: Vec<usize> = deps.into_iter().collect();
            deps.sort_unstable();
            step.dependencies = deps;
            steps.push(step);
        }

        let groups = self.compute_parallel_groups(registry, &steps);
        ExecutionPlan::new(steps, groups)
    }

    fn compute_parallel_groups(&self, registry: &ToolRegistry, steps: &[ExecutionStep]) -> Vec<Vec<usize>> {
        let mut grouped = vec![false; steps.len()];
        let mut groups = Vec::new();

        for i in 0..steps.len() {
            if grouped[i] {
                continue;
            }
            let mut group = vec![i];
            grouped[i] = true;
            for j in (i + 1)..steps.len() {
                if grouped[j] {
                    continue;
                }
                if group.iter().all(|&g| self.compatible(registry, steps, g, j)) {
                    group.push(j);
                    grouped[j] = true;
                }
            }
            groups.push(group);
        }

        groups
    }

    fn compatible(&self, registry: &ToolRegistry, steps: &[ExecutionStep], a: usize, b: usize) -> bool {
        if self.is_sequential_tool(registry, &steps[a].tool_name) || self.is_sequential_tool(registry, &steps[b].tool_name) {
            return false;
        }
        if depends_transitively(steps, a, b) || depends_transitively(steps, b, a) {
            return false;
        }
        if steps[a].category == StepCategory::Modification && steps[b].category == StepCategory::Modification {
            let pa = extract_paths(&steps[a].args);
            let pb = extract_paths(&steps[b].args);
            if pa.iter().any(|p| pb.contains(p)) {
                return false;
            }
        }
        true
    }

    /// Step ids whose status is `Pending` and whose dependencies are all `Completed`.
    pub async fn ready_steps(plan: &ExecutionPlan) -> Vec<usize> {
        let snapshot = plan.snapshot().await;
        snapshot
            .iter()
            .filter(|s| {
                s.status == StepStatus::Pending
                    && s.dependencies.iter().all(|&d| snapshot[d].status == StepStatus::Completed)
            })
            .map(|s| s.id)
            .collect()
    }
}

fn most_recent_touch(steps: &[ExecutionStep], path: &str) -> Option<usize> {
    steps
        .iter()
        .rev()
        .find(|s| extract_paths(&s.args).iter().any(|p| p == path))
        .map(|s| s.id)
}

fn most_recent_write(steps: &[ExecutionStep], path: &str) -> Option<usize> {
    steps
        .iter()
        .rev()
        .find(|s| s.category == StepCategory::Modification && extract_paths(&s.args).iter().any(|p| p == path))
        .map(|s| s.id)
}

fn depends_transitively(steps: &[ExecutionStep], from: usize, on: usize) -> bool {
    let mut queue: VecDeque<usize> = steps[from].dependencies.iter().copied().collect();
    let mut seen: HashSet<usize> = HashSet::new();
    while let Some(id) = queue.pop_front() {
        if id == on {
            return true;
        }
        if !seen.insert(id) {
            continue;
        }
        queue.extend(steps[id].dependencies.iter().copied());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inv(name: &str, args: &[(&str, &str)]) -> ToolInvocation {
        let mut map = ArgMap::new();
        for (k, v) in args {
            map.insert(k.to_string(), serde_json::json!(v));
        }
        ToolInvocation::new(format!("call-{name}"), name, map)
    }

    fn planner() -> Planner {
        Planner::new("attempt_completion")
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::builder().build()
    }

    #[test]
    fn single_read_has_no_dependencies_and_one_group() {
        let plan = planner().build_plan(&registry(), &[inv("read_file", &[("path", "main.go")])]);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.parallel_groups, vec![vec![0]]);
    }

    #[test]
    fn write_then_read_same_file_serializes() {
        let invocations =
            vec![inv("read_file", &[("path", "a.go")]), inv("write_file", &[("path", "a.go")])];
        let plan = planner().build_plan(&registry(), &invocations);
        assert_eq!(plan.parallel_groups, vec![vec![0], vec![1]]);
    }

    #[test]
    fn independent_reads_are_one_parallel_group() {
        let invocations = vec![
            inv("read_file", &[("path", "a")]),
            inv("read_file", &[("path", "b")]),
            inv("read_file", &[("path", "c")]),
        ];
        let plan = planner().build_plan(&registry(), &invocations);
        assert_eq!(plan.parallel_groups, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_depends_on_every_prior_modification() {
        let invocations = vec![
            inv("write_file", &[("path", "a")]),
            inv("write_file", &[("path", "b")]),
            inv("go_test", &[]),
        ];
        let plan = planner().build_plan(&registry(), &invocations);
        assert_eq!(plan.parallel_groups, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn completion_depends_on_every_analysis_and_modification() {
        let invocations = vec![
            inv("write_file", &[("path", "a")]),
            inv("attempt_completion", &[("result", "done")]),
        ];
        let plan = planner().build_plan(&registry(), &invocations);
        assert_eq!(plan.parallel_groups, vec![vec![0], vec![1]]);
    }

    #[test]
    fn dependency_sets_are_deterministic_across_rebuilds() {
        let invocations = vec![
            inv("read_file", &[("path", "a")]),
            inv("write_file", &[("path", "a")]),
            inv("go_test", &[]),
        ];
        let p = planner();
        let r = registry();
        let plan1 = p.build_plan(&r, &invocations);
        let plan2 = p.build_plan(&r, &invocations);
        let deps1: Vec<_> = plan1.parallel_groups.clone();
        let deps2: Vec<_> = plan2.parallel_groups.clone();
        assert_eq!(deps1, deps2);
    }
}
