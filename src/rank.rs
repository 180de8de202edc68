use crate::discovery::DiscoveredFile;

// Weight tiers. Each tier strictly dominates everything below it: depth
// contributions top out at DEPTH_STEP * MAX_SCORED_DEPTH = 6_400 and the
// service count is capped below DEPTH_STEP, so a root file always beats a
// nested one and a main-named file always beats a variant.
const ROOT_WEIGHT: i64 = 1_000_000;
const MAIN_NAME_WEIGHT: i64 = 100_000;
const DEPTH_STEP: i64 = 100;
const MAX_SCORED_DEPTH: i64 = 64;
const SERVICE_COUNT_CAP: i64 = DEPTH_STEP - 1;

/// Score one candidate by the fixed rubric: root placement, main (no
/// environment token) naming, shallowness, then service count.
pub fn priority_score(file: &DiscoveredFile) -> i64 {
    let mut score = 0;
    if file.is_root_candidate {
        score += ROOT_WEIGHT;
    }
    if file.environment.is_none() {
        score += MAIN_NAME_WEIGHT;
    }
    let depth = (file.depth as i64).min(MAX_SCORED_DEPTH);
    score += (MAX_SCORED_DEPTH - depth) * DEPTH_STEP;
    score += (file.services.len() as i64).min(SERVICE_COUNT_CAP);
    score
}

/// Order candidates best-first. The order is total and deterministic: ties
/// on score fall back to lexicographic path order, so ranking the same set
/// in any input order yields the same output.
pub fn rank(mut files: Vec<DiscoveredFile>) -> Vec<DiscoveredFile> {
    for file in &mut files {
        file.priority_score = priority_score(file);
    }
    files.sort_by(|a, b| {
        b.priority_score
            .cmp(&a.priority_score)
            .then_with(|| a.path.cmp(&b.path))
    });
    files
}
