//! Compact ascending-host-id rendering used by `Decision::ExecuteJob`:
//! an explicit comma-separated list or hyphenated range.

/// Renders a sorted, deduplicated slice of host ids as a compact ascending
/// string, collapsing consecutive runs into hyphenated ranges and joining
/// the remainder with commas (e.g. `[0,1,2,3,7]` -> `"0-3,7"`).
///
/// `ids` must already be sorted ascending and free of duplicates; the Host
/// Pool's `Allocation` type guarantees both, so callers pass its iterator
/// straight through.
pub fn format_allocation(ids: &[u32]) -> String {
    if ids.is_empty() {
        return String::new();
    }

    let mut parts = Vec::new();
    let mut run_start = ids[0];
    let mut run_end = ids[0];

    for &id in &ids[1..] {
        if id == run_end + 1 {
            run_end = id;
        } else {
            parts.push(render_run(run_start, run_end));
            run_start = id;
            run_end = id;
        }
    }
    parts.push(render_run(run_start, run_end));

    parts.join(",")
}

fn render_run(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allocation_is_empty_string() {
        assert_eq!(format_allocation(&[]), "");
    }

    #[test]
    fn single_host_has_no_dash() {
        assert_eq!(format_allocation(&[5]), "5");
    }

    #[test]
    fn contiguous_run_collapses_to_range() {
        assert_eq!(format_allocation(&[0, 1, 2, 3]), "0-3");
    }

    #[test]
    fn mixed_runs_and_singletons() {
        assert_eq!(format_allocation(&[0, 1, 2, 3, 7, 9, 10]), "0-3,7,9-10");
    }

    #[test]
    fn all_singletons_joins_with_commas() {
        assert_eq!(format_allocation(&[1, 3, 5]), "1,3,5");
    }
}
