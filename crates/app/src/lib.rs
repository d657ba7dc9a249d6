pub mod app_loop;
pub mod frame_input;
pub mod save_paths;
pub mod ui_render;
pub mod window_config;

/// Seed for a fresh run when no save exists: wall-clock nanoseconds folded
/// into a u64.
pub fn fresh_run_seed(now_seconds: f64) -> u64 {
    (now_seconds * 1_000_000_000.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_seeds_differ_across_time() {
        assert_ne!(fresh_run_seed(100.0), fresh_run_seed(100.1));
    }
}
